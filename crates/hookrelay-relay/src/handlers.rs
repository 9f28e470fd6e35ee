//! Relay HTTP handlers: registration and webhook intake.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::header::{AUTHORIZATION, USER_AGENT};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::MIN_SERVICE_PORT;
use crate::delivery::Delivery;
use crate::dispatcher::DispatchOutcome;
use crate::error::{RelayError, RelayResult};
use crate::router::RelayState;
use crate::table::ServiceEndpoint;

/// JSON success response body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// `GET /`: liveness/info.
pub async fn index_handler() -> Json<Value> {
    Json(json!({"message": "Hello, World"}))
}

/// `POST /:service/init`: validate the claimed port, probe the candidate
/// endpoint, register it, and flush any buffered delivery.
pub async fn init_service_handler(
    State(state): State<RelayState>,
    Path(service): Path<String>,
    body: String,
) -> RelayResult<Json<MessageResponse>> {
    let port = parse_init_body(&body)?;
    let endpoint = ServiceEndpoint::new(state.client_host.clone(), port);

    if !state.probe.is_up(&endpoint).await {
        tracing::warn!(service = %service, port, "registration rejected, liveness probe failed");
        return Err(RelayError::Protocol(
            "Service did not answer the liveness probe!".to_string(),
        ));
    }

    state.table.register(&service, endpoint).await;
    tracing::info!(service = %service, port, "registered service");

    match state.dispatcher.flush_queued(&service).await {
        Some(DispatchOutcome::Delivered) => {
            tracing::info!(service = %service, "sent queued delivery to re-registered service");
        }
        Some(outcome) => {
            tracing::warn!(service = %service, ?outcome, "queued delivery flush did not deliver");
        }
        None => {}
    }

    Ok(Json(MessageResponse {
        message: format!("Registered service '{service}' on port '{port}'"),
    }))
}

/// `POST /:service`: build a delivery from the inbound webhook and dispatch
/// it to the service's registered endpoint, or buffer it.
pub async fn receive_webhook_handler(
    State(state): State<RelayState>,
    Path(service): Path<String>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: String,
) -> RelayResult<Response> {
    if body.trim().is_empty() {
        return Err(RelayError::Protocol("No body specified!".to_string()));
    }
    let payload: Value = serde_json::from_str(&body)
        .map_err(|_| RelayError::Protocol("Invalid JSON body!".to_string()))?;

    let delivery = Delivery::new(
        addr.ip().to_string(),
        header_str(&headers, USER_AGENT.as_str()).unwrap_or_default(),
        header_str(&headers, AUTHORIZATION.as_str()),
        payload,
    );

    match state.dispatcher.dispatch(&service, delivery).await {
        DispatchOutcome::Delivered => Ok((
            StatusCode::OK,
            Json(MessageResponse {
                message: "Sent webhook!".to_string(),
            }),
        )
            .into_response()),
        DispatchOutcome::Queued => Ok((
            StatusCode::ACCEPTED,
            Json(MessageResponse {
                message: "Non-active service. Queued webhook.".to_string(),
            }),
        )
            .into_response()),
        DispatchOutcome::Rejected => Err(RelayError::UpstreamRejected),
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Parse the registration body: a JSON object with a `port` field holding a
/// number or a numeric string.
fn parse_init_body(body: &str) -> RelayResult<u16> {
    if body.trim().is_empty() {
        return Err(RelayError::Protocol("No body specified!".to_string()));
    }
    let value: Value = serde_json::from_str(body)
        .map_err(|_| RelayError::Protocol("Invalid JSON body!".to_string()))?;
    let Value::Object(object) = value else {
        return Err(RelayError::Protocol("Expecting a JSON object!".to_string()));
    };
    let port = match object.get("port") {
        None => return Err(RelayError::Protocol("No port specified!".to_string())),
        Some(Value::Number(number)) => number
            .as_u64()
            .and_then(|p| u16::try_from(p).ok())
            .ok_or_else(|| RelayError::Protocol("Port is not a valid number!".to_string()))?,
        Some(Value::String(text)) => text
            .parse::<u16>()
            .map_err(|_| RelayError::Protocol("Port is not a number!".to_string()))?,
        Some(_) => return Err(RelayError::Protocol("Port is not a number!".to_string())),
    };
    if port < MIN_SERVICE_PORT {
        return Err(RelayError::Protocol(format!(
            "Port must be {MIN_SERVICE_PORT} or above!"
        )));
    }
    Ok(port)
}
