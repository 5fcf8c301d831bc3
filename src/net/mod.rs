//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig (host, port, strict_port)
//!     → listener.rs (bind, next-port fallback)
//!     → Hand off TcpListener to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Fallback is bounded by `port_attempts`
//! - Strict mode reports the bind error unchanged

pub mod listener;

pub use listener::{bind, ListenerError};
