//! devproxy: local development server with path-prefix reverse proxying.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────┐    ┌──────────┐    ┌──────────────┐
//!     ───────────────────▶│   net    │───▶│   http   │───▶│   routing    │
//!                         │ listener │    │  server  │    │ (prefix rule │
//!                         └──────────┘    └──────────┘    │   lookup)    │
//!                                                         └──────┬───────┘
//!                                     Forward ┌──────────────────┴─────┐ NoMatch
//!                                             ▼                        ▼
//!                                     ┌──────────────┐        ┌──────────────┐
//!                                     │   forward    │        │ static_files │
//!                                     │ (hyper pool) │        │  (ServeDir)  │
//!                                     └──────┬───────┘        └──────────────┘
//!                                            ▼
//!                                         Backend
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;

use devproxy::config::validation::validate_config;
use devproxy::config::{load_config, ConfigError, ProxyConfig};
use devproxy::lifecycle::{signals, Shutdown};
use devproxy::observability::{logging, metrics};
use devproxy::{net, HttpServer};

/// Config file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_FILE: &str = "devproxy.toml";

#[derive(Parser, Debug)]
#[command(name = "devproxy", version)]
#[command(about = "Development server with path-prefix reverse proxying", long_about = None)]
struct Cli {
    /// Configuration file (TOML, or JSON by extension).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    port: Option<u16>,

    /// Exit instead of trying the next port when the port is taken
    /// (`--strict-port=false` turns it off).
    #[arg(long, num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    strict_port: Option<bool>,

    /// Log level (overridden by RUST_LOG).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut ProxyConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(strict_port) = self.strict_port {
            config.server.strict_port = strict_port;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}

fn read_config(cli: &Cli) -> Result<ProxyConfig, Box<dyn Error>> {
    let path = match &cli.config {
        Some(path) => Some(path.as_path()),
        None => Some(Path::new(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };

    let mut config = match path {
        Some(path) => load_config(path).map_err(|e| format!("{}: {}", path.display(), e))?,
        None => ProxyConfig::default(),
    };
    cli.apply_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = read_config(&cli)?;

    logging::init(&config.observability);

    tracing::info!("devproxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        rules = config.rules.len(),
        port = config.server.port,
        strict_port = config.server.strict_port,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Rules compile before the port is bound
    let listener_config = config.server.clone();
    let server = HttpServer::new(config)?;
    tracing::info!(rules = server.rule_count(), "Proxy rules compiled");
    let listener = net::bind(&listener_config).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::parse_from([
            "devproxy",
            "--port",
            "3000",
            "--strict-port",
            "--host",
            "0.0.0.0",
            "--log-level",
            "debug",
        ]);
        let mut config = ProxyConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.strict_port);
        assert_eq!(config.observability.log_level, "debug");
    }

    #[test]
    fn strict_port_can_be_turned_off() {
        let cli = Cli::parse_from(["devproxy", "--strict-port=false"]);
        let mut config = ProxyConfig::default();
        config.server.strict_port = true;
        cli.apply_overrides(&mut config);
        assert!(!config.server.strict_port);

        let cli = Cli::parse_from(["devproxy", "--strict-port", "--port", "3000"]);
        let mut config = ProxyConfig::default();
        cli.apply_overrides(&mut config);
        assert!(config.server.strict_port);
        assert_eq!(config.server.port, 3000);
    }

    #[test]
    fn overridden_config_is_validated() {
        let dir = std::env::temp_dir().join(format!("devproxy-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("devproxy.toml");
        std::fs::write(&path, "[server]\nport = 5173\n").unwrap();

        let config = path.to_str().unwrap();
        let cli = Cli::parse_from(["devproxy", "--config", config]);
        assert!(read_config(&cli).is_ok());

        let cli = Cli::parse_from(["devproxy", "--config", config, "--host", ""]);
        assert!(read_config(&cli).is_err());
    }

    #[test]
    fn no_flags_keep_config() {
        let cli = Cli::parse_from(["devproxy"]);
        let mut config = ProxyConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.server.port, 5173);
        assert!(!config.server.strict_port);
    }
}
