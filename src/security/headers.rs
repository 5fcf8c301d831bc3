//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//! - Strip hop-by-hop headers
//! - Choose the Host header sent upstream
//!
//! # Design Decisions
//! - Preserve original client IP chain in X-Forwarded-For
//! - Headers listed in `Connection` are treated as hop-by-hop too

use std::net::IpAddr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");

/// Headers that apply to a single connection and must not be forwarded.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}

/// Set the `Host` header for the upstream request.
///
/// With `preserve_original_host` the client's host is kept (or restored from
/// `original_host` when the request carried none, as with HTTP/2); otherwise
/// the target authority replaces it.
pub fn apply_host(
    headers: &mut HeaderMap,
    original_host: Option<&HeaderValue>,
    target_authority: &str,
    preserve_original_host: bool,
) {
    if preserve_original_host {
        if let Some(host) = original_host {
            headers.insert(header::HOST, host.clone());
            return;
        }
    }

    match HeaderValue::from_str(target_authority) {
        Ok(value) => {
            headers.insert(header::HOST, value);
        }
        Err(_) => {
            tracing::warn!(authority = %target_authority, "Target authority is not a valid Host header");
        }
    }
}

/// Append the client to `X-Forwarded-For` and set proto/host.
pub fn append_forwarded(
    headers: &mut HeaderMap,
    client_ip: IpAddr,
    original_host: Option<&HeaderValue>,
    proto: &str,
) {
    let chain = headers
        .get(&X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .map(|existing| format!("{}, {}", existing, client_ip))
        .unwrap_or_else(|| client_ip.to_string());

    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR, value);
    }
    if let Ok(value) = HeaderValue::from_str(proto) {
        headers.insert(X_FORWARDED_PROTO, value);
    }
    if let Some(host) = original_host {
        headers.insert(X_FORWARDED_HOST, host.clone());
    }
}
