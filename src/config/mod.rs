//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, rule compilation)
//!     → ProxyConfig (validated, immutable)
//!     → HttpServer compiles the Router once
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError, ConfigFormat};
pub use schema::ProxyConfig;
pub use schema::{
    LogFormat, ObservabilityConfig, RewriteConfig, RuleConfig, SecurityConfig, ServerConfig,
    StaticFilesConfig, TimeoutConfig,
};
