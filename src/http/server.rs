//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, response marker)
//! - Build the request view and ask the routing engine for a decision
//! - Apply the decision to the request headers
//! - Forward requests to the upstream registered for the target
//! - Swap the rule set when the configuration changes

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    set_header::SetResponseHeaderLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{RouteHeader, RouterConfig};
use crate::http::decision::apply_decision;
use crate::http::request::{request_attributes, request_id};
use crate::http::upstream::Upstreams;
use crate::observability::metrics;
use crate::routing::{Router as RuleRouter, RoutingDecision};

/// Path of the dry-run endpoint returning the decision for the caller.
pub const DECISION_PATH: &str = "/_smart-router/decision";

/// Path of the status endpoint listing the active rules.
pub const STATUS_PATH: &str = "/_smart-router/status";

/// Response header marking traffic that went through the router.
pub const X_SMART_ROUTER: &str = "x-smart-router";

/// Everything a request needs from the current configuration.
///
/// Replaced as a whole on reload so a request never sees a mix of old rules
/// and new upstreams.
#[derive(Debug)]
pub struct RoutingState {
    pub router: RuleRouter,
    pub upstreams: Upstreams,
    pub route_header: HeaderName,
}

impl RoutingState {
    pub fn from_config(config: &RouterConfig) -> Self {
        let route_header = parse_route_header(&config.route_header);
        Self {
            router: RuleRouter::new(&config.plugin),
            upstreams: Upstreams::from_config(&config.upstreams),
            route_header,
        }
    }
}

fn parse_route_header(route_header: &RouteHeader) -> HeaderName {
    HeaderName::from_bytes(route_header.as_ref().as_bytes()).unwrap_or_else(|_| {
        tracing::warn!(header = %route_header.as_ref(), "Invalid route header name, using default");
        HeaderName::from_static("x-route-target")
    })
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<RoutingState>>,
    pub client: Client<HttpConnector, Body>,
}

/// HTTP server for the smart router.
pub struct RouterServer {
    router: Router,
    state: AppState,
}

impl RouterServer {
    /// Create a new server with the given configuration.
    pub fn new(config: RouterConfig) -> Self {
        let routing = RoutingState::from_config(&config);
        tracing::info!(
            default_target = %routing.router.default_target(),
            rules = routing.router.rule_count(),
            upstreams = routing.upstreams.len(),
            "Smart router initialized"
        );

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(routing)),
            client,
        };

        let router = Self::build_router(&config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetResponseHeaderLayer::overriding(
                HeaderName::from_static(X_SMART_ROUTER),
                HeaderValue::from_static("active"),
            ))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route(DECISION_PATH, get(decision_handler).fallback(proxy_handler))
            .route(STATUS_PATH, get(status_handler).fallback(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// The Axum router, for serving or for driving in tests.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// Replace the active rules and upstreams.
    pub fn reload(&self, config: &RouterConfig) {
        swap_config(&self.state, config);
    }

    /// Run the server until `shutdown` fires, applying configuration updates
    /// as they arrive.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                swap_config(&state, &config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn swap_config(state: &AppState, config: &RouterConfig) {
    let routing = RoutingState::from_config(config);
    tracing::info!(
        default_target = %routing.router.default_target(),
        rules = routing.router.rule_count(),
        upstreams = routing.upstreams.len(),
        "Routing rules reloaded"
    );
    state.inner.store(Arc::new(routing));
}

/// Main proxy handler.
/// Evaluates the rules, rewrites the headers and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request);
    let routing = state.inner.load_full();

    let decision = decide(&routing, &request);
    tracing::info!(
        request_id = %request_id,
        route_target = %decision.target,
        rule = %decision.route_reason(),
        "Routing decision"
    );

    let (mut parts, body) = request.into_parts();
    apply_decision(&mut parts.headers, &decision, &routing.route_header);

    let Some(uri) = routing.upstreams.rewrite(&decision.target, &parts.uri) else {
        tracing::warn!(
            request_id = %request_id,
            route_target = %decision.target,
            "No upstream for target"
        );
        metrics::record_request(&decision.target, 502, start_time);
        return (StatusCode::BAD_GATEWAY, "No upstream for target").into_response();
    };
    parts.uri = uri;

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            metrics::record_request(&decision.target, response.status().as_u16(), start_time);
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                route_target = %decision.target,
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&decision.target, 502, start_time);
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// Dry-run: report the decision for this request without forwarding it.
///
/// Headers and the query string are evaluated as sent, but `:path` is this
/// endpoint's own path, so `path` conditions cannot be previewed here. Use
/// `smart-router eval --path` for those.
async fn decision_handler(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Json<RoutingDecision> {
    let routing = state.inner.load();
    Json(decide(&routing, &request))
}

#[derive(Debug, Serialize)]
pub struct RouterStatus {
    pub version: &'static str,
    pub default_target: String,
    /// Rule names in evaluation order.
    pub rules: Vec<String>,
    pub upstreams: usize,
}

async fn status_handler(State(state): State<AppState>) -> Json<RouterStatus> {
    let routing = state.inner.load();
    Json(RouterStatus {
        version: env!("CARGO_PKG_VERSION"),
        default_target: routing.router.default_target().to_string(),
        rules: routing.router.rules().map(|r| r.name.clone()).collect(),
        upstreams: routing.upstreams.len(),
    })
}

fn decide(routing: &RoutingState, request: &Request<Body>) -> RoutingDecision {
    let attributes = request_attributes(request);
    let decision = routing.router.evaluate(&attributes);
    metrics::record_decision(&decision.matched_rule, &decision.target);
    decision
}
