//! TCP listener binding with port fallback.
//!
//! # Responsibilities
//! - Bind to the configured host and port
//! - When the port is taken and `strict_port` is off, try the next ports
//! - Report the address finally bound

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The host does not resolve to an address.
    #[error("Invalid bind address `{0}`")]
    Address(String),
    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    /// Every port in the fallback range was in use.
    #[error("No free port in {first}..={last}")]
    Exhausted { first: u16, last: u16 },
}

/// Resolve the bind host, accepting IP literals (bare IPv6 included) and names.
pub async fn resolve_host(host: &str) -> Result<IpAddr, ListenerError> {
    let trimmed = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = trimmed.parse::<IpAddr>() {
        return Ok(ip);
    }

    tokio::net::lookup_host((host, 0))
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| addr.ip())
        .ok_or_else(|| ListenerError::Address(host.to_string()))
}

/// Bind the listener described by `config`.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ListenerError> {
    let base = SocketAddr::new(resolve_host(&config.host).await?, config.port);

    let attempts = if config.strict_port || config.port == 0 {
        1
    } else {
        config.port_attempts.max(1)
    };
    let last = base.port().saturating_add(attempts - 1);

    for port in base.port()..=last {
        let addr = SocketAddr::new(base.ip(), port);
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                let local_addr = listener
                    .local_addr()
                    .map_err(|source| ListenerError::Bind { addr, source })?;
                if port != base.port() {
                    tracing::warn!(
                        requested = base.port(),
                        port = local_addr.port(),
                        "Port in use, bound next available port"
                    );
                }
                tracing::info!(address = %local_addr, "Listener bound");
                return Ok(listener);
            }
            Err(source) if source.kind() == ErrorKind::AddrInUse && !config.strict_port => {
                tracing::debug!(port, "Port in use, trying next");
            }
            Err(source) => return Err(ListenerError::Bind { addr, source }),
        }
    }

    Err(ListenerError::Exhausted {
        first: base.port(),
        last,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_config(port: u16, strict_port: bool) -> ServerConfig {
        ServerConfig {
            host: "127.0.0.1".into(),
            port,
            strict_port,
            port_attempts: 20,
            ..ServerConfig::default()
        }
    }

    #[tokio::test]
    async fn falls_back_to_next_port() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let listener = bind(&server_config(port, false)).await.unwrap();
        let bound = listener.local_addr().unwrap().port();
        assert_ne!(bound, port);
        assert!(bound > port);
    }

    #[tokio::test]
    async fn strict_port_fails_when_taken() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = bind(&server_config(port, true)).await.unwrap_err();
        assert!(matches!(err, ListenerError::Bind { .. }));
    }

    #[tokio::test]
    async fn port_zero_binds_ephemeral() {
        let listener = bind(&server_config(0, false)).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn resolves_names_and_bare_ipv6() {
        let ip = resolve_host("localhost").await.unwrap();
        assert!(ip.is_loopback());

        assert_eq!(resolve_host("::1").await.unwrap(), IpAddr::from([0u16, 0, 0, 0, 0, 0, 0, 1]));
        assert_eq!(resolve_host("[::1]").await.unwrap(), IpAddr::from([0u16, 0, 0, 0, 0, 0, 0, 1]));
        assert_eq!(resolve_host("0.0.0.0").await.unwrap(), IpAddr::from([0u8, 0, 0, 0]));
    }

    #[tokio::test]
    async fn binds_hostname() {
        let mut config = server_config(0, true);
        config.host = "localhost".into();

        let listener = bind(&config).await.unwrap();
        let addr = listener.local_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn rejects_bad_host() {
        let mut config = server_config(5173, false);
        config.host = "not a host".into();
        assert!(matches!(bind(&config).await, Err(ListenerError::Address(_))));
    }
}
