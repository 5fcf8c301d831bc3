//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every rule to catch bad prefixes, targets and patterns
//! - Validate value ranges (timeouts > 0, base path shape)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::routing::rule::{Rule, RuleError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("rule #{index}: {source}")]
    Rule {
        index: usize,
        #[source]
        source: RuleError,
    },

    #[error("timeouts.{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("static_files.base_path `{0}` must start and end with `/`")]
    BasePath(String),

    #[error("server.host must not be empty")]
    EmptyHost,

    #[error("server.{field} must be at least 1")]
    ZeroLimit { field: &'static str },
}

/// Validate a parsed configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for (index, rule) in config.rules.iter().enumerate() {
        if let Err(source) = Rule::from_config(rule) {
            errors.push(ValidationError::Rule { index, source });
        }
    }

    let timeouts = &config.timeouts;
    for (field, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("upstream_secs", timeouts.upstream_secs),
        ("request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout { field });
        }
    }

    let base = &config.static_files.base_path;
    if !base.starts_with('/') || !base.ends_with('/') {
        errors.push(ValidationError::BasePath(base.clone()));
    }

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }
    if config.server.port_attempts == 0 {
        errors.push(ValidationError::ZeroLimit {
            field: "port_attempts",
        });
    }
    if config.server.max_concurrent_requests == 0 {
        errors.push(ValidationError::ZeroLimit {
            field: "max_concurrent_requests",
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
