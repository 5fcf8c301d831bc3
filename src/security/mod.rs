//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Matched request:
//!     → headers.rs (strip hop-by-hop, pick Host, add X-Forwarded-*)
//!     → Forward to upstream
//!
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → Stream to client
//! ```
//!
//! # Design Decisions
//! - No trust in client connection headers
//! - Body size bounded by a tower-http limit layer in the server

pub mod headers;
