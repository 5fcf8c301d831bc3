//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the development proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (host, port, port fallback).
    pub server: ServerConfig,

    /// Local static content served when no rule matches.
    pub static_files: StaticFilesConfig,

    /// Proxy rules, evaluated in declaration order.
    pub rules: Vec<RuleConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Header and body hardening.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind (e.g., "127.0.0.1").
    pub host: String,

    /// Preferred port.
    pub port: u16,

    /// Fail instead of trying the next port when `port` is taken.
    pub strict_port: bool,

    /// How many consecutive ports to try when not strict.
    pub port_attempts: u16,

    /// Maximum in-flight requests (backpressure).
    pub max_concurrent_requests: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5173,
            strict_port: false,
            port_attempts: 10,
            max_concurrent_requests: 1024,
        }
    }
}

/// Static file serving for requests no rule claims.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory to serve from. Unmatched requests get 404 when unset.
    pub root: Option<PathBuf>,

    /// Public base path the files are mounted under (e.g., "/users/").
    pub base_path: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: None,
            base_path: "/".to_string(),
        }
    }
}

/// A single proxy rule.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RuleConfig {
    /// Request path prefix to match (literal, case-sensitive).
    pub prefix: String,

    /// Upstream origin (e.g., "http://localhost:8000").
    pub target: String,

    /// Send the target authority as `Host` instead of the client's.
    #[serde(default)]
    pub change_origin: bool,

    /// Path rewrite applied before forwarding.
    #[serde(default)]
    pub rewrite: RewriteConfig,
}

/// Path rewrite declaration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewriteConfig {
    #[default]
    None,
    StripPrefix,
    Pattern {
        pattern: String,
        #[serde(default)]
        replacement: String,
    },
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time to wait for upstream response headers in seconds.
    pub upstream_secs: u64,

    /// Total time for a client request in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add X-Forwarded-For/Proto/Host to upstream requests.
    pub forwarded_headers: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            forwarded_headers: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}
