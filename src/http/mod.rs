//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → routing::Router (forward decision or no-match)
//!     → forward.rs (upstream request, timeouts)    | static_files.rs (local content)
//!     → response.rs (strip hop-by-hop, map errors)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use forward::{ForwardError, ForwardOptions};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
