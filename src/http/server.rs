//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler
//! - Wire up middleware (request ID, tracing, timeout, limits)
//! - Dispatch requests to the routing engine
//! - Forward matched requests upstream, serve the rest locally
//! - Observability (metrics, request IDs)

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::{limit::ConcurrencyLimitLayer, ServiceBuilder};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ProxyConfig;
use crate::http::forward::{self, ForwardOptions, UpstreamClient};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::static_files::StaticFiles;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::routing::{RouteDecision, Router as ProxyRouter, RuleError};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub client: UpstreamClient,
    pub forward_options: ForwardOptions,
    pub static_files: Option<StaticFiles>,
}

/// HTTP server for the development proxy.
pub struct HttpServer {
    router: Router,
    rule_count: usize,
}

impl HttpServer {
    /// Create a new HTTP server, compiling the proxy rules.
    pub fn new(config: ProxyConfig) -> Result<Self, RuleError> {
        let proxy_router = Arc::new(ProxyRouter::from_config(&config.rules)?);
        let rule_count = proxy_router.len();

        let client = forward::build_client(Duration::from_secs(config.timeouts.connect_secs));

        let static_files = config.static_files.root.as_ref().map(|root| {
            tracing::info!(
                root = %root.display(),
                base_path = %config.static_files.base_path,
                "Serving static files"
            );
            StaticFiles::new(root, config.static_files.base_path.clone())
        });

        let state = AppState {
            router: proxy_router,
            client,
            forward_options: ForwardOptions::from(&config),
            static_files,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, rule_count })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    // Body limit sits outside the timeout, whose inner body must be `Default`
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
                    .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests)),
            )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.rule_count,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown::wait(shutdown_rx))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Number of compiled proxy rules.
    pub fn rule_count(&self) -> usize {
        self.rule_count
    }
}

/// Main proxy handler.
/// Routes the path, then forwards upstream or serves locally.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let decision = match state.router.route(&path) {
        RouteDecision::Forward(decision) => decision,
        RouteDecision::NoMatch => {
            return match &state.static_files {
                Some(files) => {
                    let response = files.serve(request).await;
                    tracing::debug!(
                        request_id = %request_id,
                        path = %path,
                        status = %response.status(),
                        "Served local content"
                    );
                    metrics::record_request(&method, response.status().as_u16(), metrics::RULE_STATIC, start_time);
                    response
                }
                None => {
                    tracing::debug!(request_id = %request_id, path = %path, "No rule matched");
                    metrics::record_request(&method, 404, metrics::RULE_NONE, start_time);
                    (StatusCode::NOT_FOUND, "No matching route found").into_response()
                }
            };
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        rule = %decision.prefix,
        target = %decision.target,
        forwarded_path = %decision.forwarded_path,
        "Proxying request"
    );

    match forward::forward(&state.client, &decision, request, client_addr, &state.forward_options).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), decision.prefix, start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                rule = %decision.prefix,
                target = %decision.target,
                error = %e,
                "Upstream error"
            );
            metrics::record_upstream_error(decision.prefix, e.kind());
            let response = e.into_response();
            metrics::record_request(&method, response.status().as_u16(), decision.prefix, start_time);
            response
        }
    }
}
