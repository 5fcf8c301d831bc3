//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled rules in declaration order
//! - Look up the first rule matching a request path
//! - Return a forwarding decision or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) path prefix scan (acceptable for typical rule counts)
//! - Explicit NoMatch rather than silent default

use url::Url;

use crate::config::schema::RuleConfig;
use crate::routing::rule::{Rule, RuleError};

/// Where and how a matched request should be forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forward<'a> {
    /// Prefix of the rule that matched.
    pub prefix: &'a str,
    /// Upstream the request goes to.
    pub target: &'a Url,
    /// Request path after rewriting; always starts with `/`.
    pub forwarded_path: String,
    /// Keep the client's `Host` header instead of the target authority.
    pub preserve_original_host: bool,
}

/// Outcome of routing a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision<'a> {
    Forward(Forward<'a>),
    NoMatch,
}

impl RouteDecision<'_> {
    pub fn is_match(&self) -> bool {
        matches!(self, RouteDecision::Forward(_))
    }
}

/// Ordered, immutable rule set.
#[derive(Debug, Clone, Default)]
pub struct Router {
    rules: Vec<Rule>,
}

impl Router {
    /// Create a router; rules are evaluated in the given order.
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Compile a router from configuration, failing on the first bad rule.
    pub fn from_config(configs: &[RuleConfig]) -> Result<Self, RuleError> {
        let rules = configs
            .iter()
            .map(Rule::from_config)
            .collect::<Result<Vec<_>, _>>()?;

        for rule in &rules {
            tracing::debug!(
                prefix = %rule.prefix(),
                target = %rule.target(),
                change_origin = rule.changes_origin(),
                "Proxy rule registered"
            );
        }

        Ok(Self::new(rules))
    }

    /// Route a request path. First matching rule in declaration order wins.
    pub fn route(&self, path: &str) -> RouteDecision<'_> {
        self.rules
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| {
                RouteDecision::Forward(Forward {
                    prefix: rule.prefix(),
                    target: rule.target(),
                    forwarded_path: rule.forwarded_path(path),
                    preserve_original_host: !rule.changes_origin(),
                })
            })
            .unwrap_or(RouteDecision::NoMatch)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
