//! Local static content for requests no rule claims.
//!
//! Files are mounted under the public base path: with base `/users/`, the
//! request `/users/app.js` is served from `<root>/app.js`. Paths outside the
//! base get 404. Unknown files fall back to `index.html` so client-side
//! routes of a single-page app resolve.

use std::convert::Infallible;
use std::path::Path;

use axum::body::Body;
use axum::http::{Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::{ServeDir, ServeFile};

#[derive(Debug, Clone)]
pub struct StaticFiles {
    base_path: String,
    service: ServeDir<ServeFile>,
}

impl StaticFiles {
    pub fn new(root: impl AsRef<Path>, base_path: impl Into<String>) -> Self {
        let root = root.as_ref();
        Self {
            base_path: base_path.into(),
            service: ServeDir::new(root).fallback(ServeFile::new(root.join("index.html"))),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Map a request path to a path relative to the static root.
    pub fn strip_base(&self, path: &str) -> Option<String> {
        let base = self.base_path.as_str();
        if let Some(rest) = path.strip_prefix(base) {
            return Some(format!("/{}", rest));
        }
        // "/users" addresses the root of "/users/"
        if path == base.trim_end_matches('/') {
            return Some("/".to_string());
        }
        None
    }

    pub async fn serve(&self, request: Request<Body>) -> Response {
        let Some(path) = self.strip_base(request.uri().path()) else {
            return not_found();
        };

        let (mut parts, body) = request.into_parts();
        let path_and_query = match parts.uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };
        parts.uri = match Uri::builder().path_and_query(path_and_query).build() {
            Ok(uri) => uri,
            Err(_) => return not_found(),
        };

        let result: Result<_, Infallible> = self
            .service
            .clone()
            .oneshot(Request::from_parts(parts, body))
            .await;
        match result {
            Ok(response) => response.map(Body::new).into_response(),
            Err(never) => match never {},
        }
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "No matching route found").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_base_path() {
        let files = StaticFiles::new("dist", "/users/");

        assert_eq!(files.strip_base("/users/app.js").as_deref(), Some("/app.js"));
        assert_eq!(files.strip_base("/users/").as_deref(), Some("/"));
        assert_eq!(files.strip_base("/users").as_deref(), Some("/"));
        assert_eq!(files.strip_base("/assets/app.js"), None);
        assert_eq!(files.strip_base("/usersx"), None);
    }

    #[test]
    fn root_base_is_identity() {
        let files = StaticFiles::new("dist", "/");

        assert_eq!(files.strip_base("/").as_deref(), Some("/"));
        assert_eq!(files.strip_base("/assets/app.js").as_deref(), Some("/assets/app.js"));
    }
}
