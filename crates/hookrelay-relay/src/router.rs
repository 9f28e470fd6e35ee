//! Axum router setup for the relay HTTP surface.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request};
use axum::http::header::USER_AGENT;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use crate::config::RelayConfig;
use crate::dispatcher::DeliveryDispatcher;
use crate::error::RelayResult;
use crate::handlers;
use crate::probe::{HttpLivenessProbe, LivenessProbe};
use crate::table::ServiceTable;

/// Shared state for relay handlers.
#[derive(Clone)]
pub struct RelayState {
    pub table: Arc<ServiceTable>,
    pub dispatcher: Arc<DeliveryDispatcher>,
    pub probe: Arc<dyn LivenessProbe>,
    pub client_host: String,
}

impl RelayState {
    /// Build the production state: shared table, HTTP dispatcher and probe.
    pub fn new(config: &RelayConfig) -> RelayResult<Self> {
        let probe = Arc::new(HttpLivenessProbe::new(config.probe_timeout())?);
        Self::with_probe(config, probe)
    }

    /// Build state with a caller-supplied probe. Used by tests to stub probe
    /// outcomes.
    pub fn with_probe(config: &RelayConfig, probe: Arc<dyn LivenessProbe>) -> RelayResult<Self> {
        let table = Arc::new(ServiceTable::new());
        let dispatcher = Arc::new(DeliveryDispatcher::new(
            Arc::clone(&table),
            config.connect_timeout(),
            config.forward_timeout(),
        )?);
        Ok(Self {
            table,
            dispatcher,
            probe,
            client_host: config.client_host.clone(),
        })
    }
}

/// Creates the relay router with all routes.
pub fn relay_router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/:service/init", post(handlers::init_service_handler))
        .route("/:service", post(handlers::receive_webhook_handler))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// After-request logging: status, method, client IP, user-agent and URI.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "-".to_string(), |info| info.0.ip().to_string());

    let response = next.run(request).await;

    tracing::info!(
        status = response.status().as_u16(),
        %method,
        ip = %ip,
        user_agent = %user_agent,
        uri = %uri,
        "handled request"
    );
    response
}
