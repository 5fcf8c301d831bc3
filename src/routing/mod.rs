//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (rule lookup, declaration order)
//!     → matcher.rs (literal prefix check)
//!     → rule.rs (path rewrite)
//!     → Return: Forward decision or NoMatch
//!
//! Rule Compilation (at startup):
//!     RuleConfig[]
//!     → Parse targets, compile rewrite patterns
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in the match step (prefix matching only)
//! - Deterministic: same input always matches same rule
//! - First match wins (declaration order, not longest prefix)

pub mod matcher;
pub mod router;
pub mod rule;

pub use router::{Forward, RouteDecision, Router};
pub use rule::{Rewrite, Rule, RuleError};
