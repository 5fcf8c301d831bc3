//! Proxy rule definitions.
//!
//! A [`Rule`] pairs a path prefix with an upstream target, an optional path
//! rewrite and the `change_origin` flag. Rules are validated when built so
//! that a malformed configuration fails at startup rather than per request.

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::{RewriteConfig, RuleConfig};
use crate::routing::matcher::{Matcher, PathPrefixMatcher};

/// Errors raised while building a rule from configuration.
#[derive(Debug, Error)]
pub enum RuleError {
    /// The rule prefix was empty, which would match every request.
    #[error("rule prefix must not be empty")]
    EmptyPrefix,

    /// Request paths always begin with `/`, so this prefix could never match.
    #[error("rule prefix `{0}` must start with `/`")]
    RelativePrefix(String),

    /// The target could not be parsed as an absolute URL.
    #[error("invalid target `{target}` for prefix `{prefix}`: {source}")]
    InvalidTarget {
        prefix: String,
        target: String,
        #[source]
        source: url::ParseError,
    },

    /// The target URL has no host to connect to.
    #[error("target `{target}` for prefix `{prefix}` has no host")]
    MissingHost { prefix: String, target: String },

    /// The target scheme is not plain HTTP (TLS upstreams are not supported).
    #[error("target `{target}` for prefix `{prefix}` uses unsupported scheme `{scheme}`, expected `http`")]
    UnsupportedScheme {
        prefix: String,
        target: String,
        scheme: String,
    },

    /// The rewrite pattern is not a valid regular expression.
    #[error("invalid rewrite pattern `{pattern}` for prefix `{prefix}`: {source}")]
    InvalidPattern {
        prefix: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Path transformation applied to a matched request before forwarding.
#[derive(Debug, Clone, Default)]
pub enum Rewrite {
    /// Forward the request path unchanged.
    #[default]
    None,
    /// Remove the rule prefix from the start of the path.
    StripPrefix,
    /// Replace the first match of `regex` with `replacement`.
    Pattern { regex: Regex, replacement: String },
}

impl Rewrite {
    /// Compile a pattern rewrite.
    pub fn pattern(pattern: &str, replacement: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Rewrite::Pattern {
            regex: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Apply the rewrite to a path matched by `prefix`.
    ///
    /// The result always begins with `/`; an empty result becomes `/`.
    pub fn apply(&self, prefix: &str, path: &str) -> String {
        let rewritten = match self {
            Rewrite::None => return path.to_string(),
            Rewrite::StripPrefix => path.strip_prefix(prefix).unwrap_or(path).to_string(),
            Rewrite::Pattern { regex, replacement } => {
                regex.replace(path, replacement.as_str()).into_owned()
            }
        };

        if rewritten.starts_with('/') {
            rewritten
        } else {
            format!("/{}", rewritten)
        }
    }
}

impl PartialEq for Rewrite {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Rewrite::None, Rewrite::None) => true,
            (Rewrite::StripPrefix, Rewrite::StripPrefix) => true,
            (
                Rewrite::Pattern { regex: a, replacement: ra },
                Rewrite::Pattern { regex: b, replacement: rb },
            ) => a.as_str() == b.as_str() && ra == rb,
            _ => false,
        }
    }
}

impl Eq for Rewrite {}

/// A single compiled proxy rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    matcher: PathPrefixMatcher,
    target: Url,
    rewrite: Rewrite,
    change_origin: bool,
}

impl Rule {
    /// Create a rule forwarding `prefix` to `target` with no rewrite.
    pub fn new(prefix: impl Into<String>, target: Url) -> Result<Self, RuleError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(RuleError::EmptyPrefix);
        }
        if !prefix.starts_with('/') {
            return Err(RuleError::RelativePrefix(prefix));
        }

        if target.scheme() != "http" {
            return Err(RuleError::UnsupportedScheme {
                scheme: target.scheme().to_string(),
                target: target.to_string(),
                prefix,
            });
        }

        if target.host_str().map_or(true, str::is_empty) {
            return Err(RuleError::MissingHost {
                target: target.to_string(),
                prefix,
            });
        }

        Ok(Self {
            matcher: PathPrefixMatcher::new(prefix),
            target,
            rewrite: Rewrite::None,
            change_origin: false,
        })
    }

    /// Set the path rewrite.
    pub fn with_rewrite(mut self, rewrite: Rewrite) -> Self {
        self.rewrite = rewrite;
        self
    }

    /// Set whether the upstream receives its own authority as `Host`.
    pub fn change_origin(mut self, change_origin: bool) -> Self {
        self.change_origin = change_origin;
        self
    }

    /// Build a rule from its configuration entry.
    pub fn from_config(config: &RuleConfig) -> Result<Self, RuleError> {
        if config.prefix.is_empty() {
            return Err(RuleError::EmptyPrefix);
        }

        let target = Url::parse(&config.target).map_err(|source| RuleError::InvalidTarget {
            prefix: config.prefix.clone(),
            target: config.target.clone(),
            source,
        })?;

        let rewrite = match &config.rewrite {
            RewriteConfig::None => Rewrite::None,
            RewriteConfig::StripPrefix => Rewrite::StripPrefix,
            RewriteConfig::Pattern {
                pattern,
                replacement,
            } => Rewrite::pattern(pattern, replacement.clone()).map_err(|source| {
                RuleError::InvalidPattern {
                    prefix: config.prefix.clone(),
                    pattern: pattern.clone(),
                    source,
                }
            })?,
        };

        Ok(Rule::new(config.prefix.clone(), target)?
            .with_rewrite(rewrite)
            .change_origin(config.change_origin))
    }

    pub fn prefix(&self) -> &str {
        self.matcher.prefix()
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    pub fn rewrite(&self) -> &Rewrite {
        &self.rewrite
    }

    pub fn changes_origin(&self) -> bool {
        self.change_origin
    }

    /// Returns true if the request path falls under this rule.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.matches(path)
    }

    /// Compute the path to forward upstream for a matched request.
    pub fn forwarded_path(&self, path: &str) -> String {
        self.rewrite.apply(self.prefix(), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> Url {
        Url::parse("http://localhost:8000").unwrap()
    }

    #[test]
    fn strip_prefix_rewrite() {
        let rule = Rule::new("/api", backend())
            .unwrap()
            .with_rewrite(Rewrite::StripPrefix);

        assert_eq!(rule.forwarded_path("/api/items"), "/items");
        assert_eq!(rule.forwarded_path("/api/search/deep"), "/search/deep");
    }

    #[test]
    fn empty_rewrite_result_forwards_root() {
        let rule = Rule::new("/api", backend())
            .unwrap()
            .with_rewrite(Rewrite::StripPrefix);
        assert_eq!(rule.forwarded_path("/api"), "/");

        let pattern = Rewrite::pattern("^/api", "").unwrap();
        assert_eq!(pattern.apply("/api", "/api"), "/");
    }

    #[test]
    fn rewrite_result_gets_leading_slash() {
        let rewrite = Rewrite::StripPrefix;
        assert_eq!(rewrite.apply("/api", "/apiv2/x"), "/v2/x");
    }

    #[test]
    fn pattern_rewrite_replaces_first_match() {
        let rewrite = Rewrite::pattern("^/api/v(\\d+)", "/version-$1").unwrap();
        assert_eq!(rewrite.apply("/api", "/api/v2/users"), "/version-2/users");

        let rewrite = Rewrite::pattern("/x", "/y").unwrap();
        assert_eq!(rewrite.apply("/x", "/x/x"), "/y/x");
    }

    #[test]
    fn no_rewrite_keeps_path() {
        let rule = Rule::new("/search", backend()).unwrap();
        assert_eq!(rule.forwarded_path("/search?q=ana"), "/search?q=ana");
    }

    #[test]
    fn empty_prefix_rejected() {
        assert!(matches!(
            Rule::new("", backend()),
            Err(RuleError::EmptyPrefix)
        ));
    }

    #[test]
    fn relative_prefix_rejected() {
        assert!(matches!(
            Rule::new("api", backend()),
            Err(RuleError::RelativePrefix(ref p)) if p == "api"
        ));
    }

    #[test]
    fn non_http_target_rejected() {
        let target = Url::parse("ftp://files.example.com").unwrap();
        assert!(matches!(
            Rule::new("/files", target),
            Err(RuleError::UnsupportedScheme { .. })
        ));

        let target = Url::parse("https://localhost:8443").unwrap();
        assert!(matches!(
            Rule::new("/secure", target),
            Err(RuleError::UnsupportedScheme { ref scheme, .. }) if scheme == "https"
        ));

        let target = Url::parse("mailto:ops@example.com").unwrap();
        assert!(Rule::new("/mail", target).is_err());
    }

    #[test]
    fn from_config_reports_bad_target_and_pattern() {
        let config = RuleConfig {
            prefix: "/api".into(),
            target: "localhost:8000/no-scheme".into(),
            change_origin: true,
            rewrite: RewriteConfig::None,
        };
        assert!(Rule::from_config(&config).is_err());

        let config = RuleConfig {
            prefix: "/api".into(),
            target: "http://localhost:8000".into(),
            change_origin: true,
            rewrite: RewriteConfig::Pattern {
                pattern: "^/api(".into(),
                replacement: String::new(),
            },
        };
        assert!(matches!(
            Rule::from_config(&config),
            Err(RuleError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn from_config_builds_rule() {
        let config = RuleConfig {
            prefix: "/api".into(),
            target: "http://localhost:8000".into(),
            change_origin: true,
            rewrite: RewriteConfig::StripPrefix,
        };
        let rule = Rule::from_config(&config).unwrap();

        assert_eq!(rule.prefix(), "/api");
        assert_eq!(rule.target().as_str(), "http://localhost:8000/");
        assert_eq!(rule.rewrite(), &Rewrite::StripPrefix);
        assert!(rule.changes_origin());
    }
}
