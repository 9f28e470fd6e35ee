//! Axum router for the local delivery intake: the endpoint the relay
//! forwards webhooks to.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::error::{ClientError, ClientResult};
use crate::event::{InboundEvent, WebhookBatchReceiveEvent, WebhookListener, WebhookReceiveEvent};
use crate::sender::{classify, RequestFingerprint};

/// Shared state for intake handlers.
#[derive(Clone)]
pub struct IntakeState {
    listeners: Arc<Vec<Arc<dyn WebhookListener>>>,
    use_batch: bool,
}

impl IntakeState {
    pub fn new(listeners: Vec<Arc<dyn WebhookListener>>, use_batch: bool) -> Self {
        Self {
            listeners: Arc::new(listeners),
            use_batch,
        }
    }
}

/// Creates the intake router with all routes.
pub fn client_router(state: IntakeState) -> Router {
    Router::new()
        .route("/", get(hello_handler).post(receive_handler))
        .route("/batch", post(receive_batch_handler))
        .route("/ping", get(ping_handler))
        .fallback(fallback_handler)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

/// `GET /ping`: answers the relay's liveness probe.
async fn ping_handler() -> Json<Value> {
    Json(json!({"isUp": true}))
}

async fn hello_handler() -> Json<Value> {
    Json(json!({"Hello": "World"}))
}

/// Unmatched routes: GETs get the hello body, anything else an error.
async fn fallback_handler(method: Method) -> Response {
    if method == Method::GET {
        hello_handler().await.into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Route not found!"})),
        )
            .into_response()
    }
}

/// `POST /`: single-delivery intake.
async fn receive_handler(
    State(state): State<IntakeState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: String,
) -> ClientResult<Json<Value>> {
    let payload = parse_body(&body)?;
    let sender = classify(&fingerprint(addr, &headers));
    dispatch_event(
        &state,
        InboundEvent::Single(WebhookReceiveEvent {
            sender,
            authorization: header_str(&headers, AUTHORIZATION.as_str()),
            origin_ip: header_str(&headers, "sent-by"),
            payload,
        }),
    );
    Ok(Json(json!({"message": "WebHook received!"})))
}

/// `POST /batch`: batch-delivery intake; the body must be a non-empty JSON
/// array.
async fn receive_batch_handler(
    State(state): State<IntakeState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: String,
) -> ClientResult<Json<Value>> {
    let payload = parse_body(&body)?;
    let Value::Array(webhooks) = payload else {
        return Err(ClientError::Protocol(
            "Batch requires a JSON array!".to_string(),
        ));
    };
    if webhooks.is_empty() {
        return Err(ClientError::Protocol(
            "Batch array must not be empty!".to_string(),
        ));
    }
    let sender = classify(&fingerprint(addr, &headers));
    dispatch_event(
        &state,
        InboundEvent::Batch(WebhookBatchReceiveEvent {
            sender,
            authorization: header_str(&headers, AUTHORIZATION.as_str()),
            origin_ip: header_str(&headers, "sent-by"),
            webhooks,
        }),
    );
    Ok(Json(json!({"message": "WebHook received!"})))
}

/// Hand an event to every registered listener. Batches are expanded into
/// per-element single events unless batch mode is configured.
fn dispatch_event(state: &IntakeState, event: InboundEvent) {
    match event {
        InboundEvent::Single(event) => {
            for listener in state.listeners.iter() {
                listener.on_webhook(&event);
            }
        }
        InboundEvent::Batch(event) => {
            if state.use_batch {
                for listener in state.listeners.iter() {
                    listener.on_batch(&event);
                }
            } else {
                for element in &event.webhooks {
                    let single = WebhookReceiveEvent {
                        sender: event.sender.clone(),
                        authorization: event.authorization.clone(),
                        origin_ip: event.origin_ip.clone(),
                        payload: element.clone(),
                    };
                    for listener in state.listeners.iter() {
                        listener.on_webhook(&single);
                    }
                }
            }
        }
    }
}

fn parse_body(body: &str) -> ClientResult<Value> {
    if body.trim().is_empty() {
        return Err(ClientError::Protocol("Body required.".to_string()));
    }
    serde_json::from_str(body)
        .map_err(|_| ClientError::Protocol("Invalid JSON object!".to_string()))
}

fn fingerprint(addr: SocketAddr, headers: &HeaderMap) -> RequestFingerprint {
    RequestFingerprint {
        ip: addr.ip().to_string(),
        user_agent: header_str(headers, USER_AGENT.as_str()).unwrap_or_default(),
        headers: headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or("").to_string(),
                )
            })
            .collect(),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
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
