//! Upstream forwarding transport.
//!
//! Turns a [`Forward`] decision into an upstream request: builds the target
//! URI, rewrites headers, sends it with the pooled hyper client and streams
//! the response back. Timeouts and connection failures are handled here,
//! never in the router.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, HeaderValue, Request, Response, Uri, Version};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use url::{Position, Url};

use crate::config::ProxyConfig;
use crate::http::response;
use crate::routing::Forward;
use crate::security::headers::{append_forwarded, apply_host, strip_hop_by_hop};

/// Pooled client used for every upstream request.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Errors raised while forwarding a matched request.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream URI: {0}")]
    Uri(#[from] axum::http::Error),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

/// Transport settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct ForwardOptions {
    pub upstream_timeout: Duration,
    pub forwarded_headers: bool,
}

impl From<&ProxyConfig> for ForwardOptions {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
            forwarded_headers: config.security.forwarded_headers,
        }
    }
}

/// Build the upstream client with a connect timeout.
pub fn build_client(connect_timeout: Duration) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    connector.set_nodelay(true);
    Client::builder(TokioExecutor::new()).build(connector)
}

/// `host[:port]` of the target, as sent in `Host` when changing origin.
pub fn target_authority(target: &Url) -> &str {
    &target[Position::BeforeHost..Position::AfterPort]
}

/// Join the target path, the forwarded path and the original query.
pub fn upstream_uri(target: &Url, forwarded_path: &str, query: Option<&str>) -> Result<Uri, ForwardError> {
    let mut path_and_query = format!("{}{}", target.path().trim_end_matches('/'), forwarded_path);
    if let Some(query) = query {
        path_and_query.push('?');
        path_and_query.push_str(query);
    }

    Ok(Uri::builder()
        .scheme(target.scheme())
        .authority(target_authority(target))
        .path_and_query(path_and_query)
        .build()?)
}

/// Forward `request` according to `decision`.
pub async fn forward(
    client: &UpstreamClient,
    decision: &Forward<'_>,
    request: Request<Body>,
    client_addr: SocketAddr,
    options: &ForwardOptions,
) -> Result<Response<Body>, ForwardError> {
    let (mut parts, body) = request.into_parts();

    // HTTP/2 clients send the authority in the URI instead of Host
    let original_host = parts.headers.get(header::HOST).cloned().or_else(|| {
        parts
            .uri
            .authority()
            .and_then(|authority| HeaderValue::from_str(authority.as_str()).ok())
    });

    parts.uri = upstream_uri(decision.target, &decision.forwarded_path, parts.uri.query())?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    apply_host(
        &mut parts.headers,
        original_host.as_ref(),
        target_authority(decision.target),
        decision.preserve_original_host,
    );
    if options.forwarded_headers {
        append_forwarded(&mut parts.headers, client_addr.ip(), original_host.as_ref(), "http");
    }

    let upstream = client.request(Request::from_parts(parts, body));
    let upstream_response = tokio::time::timeout(options.upstream_timeout, upstream)
        .await
        .map_err(|_| ForwardError::Timeout(options.upstream_timeout))??;

    Ok(response::from_upstream(upstream_response))
}
