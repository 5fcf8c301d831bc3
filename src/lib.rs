//! Development reverse proxy library.
//!
//! Routes requests by path prefix to upstream backends, rewriting paths and
//! the `Host` header per rule, and serves everything else from a local
//! static directory.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteDecision, Router};
