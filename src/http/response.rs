//! Response handling and transformation.
//!
//! # Responsibilities
//! - Transform upstream responses for the client
//! - Map forwarding errors to HTTP status codes
//!
//! # Design Decisions
//! - Streaming responses avoid buffering the entire body
//! - Hop-by-hop headers stripped automatically
//! - Upstream timeouts result in 504 Gateway Timeout, other failures in 502

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use hyper::body::Incoming;

use crate::http::forward::ForwardError;
use crate::security::headers::strip_hop_by_hop;

/// Convert an upstream response into a client response.
pub fn from_upstream(response: Response<Incoming>) -> Response<Body> {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}

impl ForwardError {
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ForwardError::Uri(_) | ForwardError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Uri(_) => "uri",
            ForwardError::Upstream(e) if e.is_connect() => "connect",
            ForwardError::Upstream(_) => "upstream",
            ForwardError::Timeout(_) => "timeout",
        }
    }
}

impl IntoResponse for ForwardError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            ForwardError::Timeout(_) => "Upstream timed out",
            ForwardError::Uri(_) => "Invalid upstream URI",
            ForwardError::Upstream(_) => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn timeout_maps_to_gateway_timeout() {
        let err = ForwardError::Timeout(Duration::from_secs(30));
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(err.kind(), "timeout");
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn bad_uri_maps_to_bad_gateway() {
        let err = axum::http::Uri::builder()
            .scheme("http")
            .authority("bad authority")
            .path_and_query("/")
            .build()
            .unwrap_err();
        let err = ForwardError::Uri(err);
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
