//! Delivery model: one webhook payload in flight or buffered, plus its
//! origin metadata.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// One unit of payload, created at relay intake.
///
/// Either forwarded immediately or parked in the pending buffer; consumed
/// exactly once, on a later successful forward or by being folded into a
/// newer buffered delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// Correlation id for logs.
    pub id: Uuid,
    /// IP the webhook arrived from, forwarded downstream as `Sent-By`.
    pub origin_ip: String,
    /// Original sender's user-agent, forwarded as the transport user-agent.
    pub origin_user_agent: String,
    /// `Authorization` header of the original request, if any.
    pub origin_authorization: Option<String>,
    /// The JSON body exactly as received.
    pub payload: Value,
    pub received_at: DateTime<Utc>,
}

impl Delivery {
    pub fn new(
        origin_ip: String,
        origin_user_agent: String,
        origin_authorization: Option<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin_ip,
            origin_user_agent,
            origin_authorization,
            payload,
            received_at: Utc::now(),
        }
    }

    /// A delivery is a batch iff its payload is a JSON array with more than
    /// one element. A single-element array is not a batch.
    pub fn is_batch(&self) -> bool {
        matches!(&self.payload, Value::Array(items) if items.len() > 1)
    }
}

/// Fold an older buffered payload and a newer one into a single JSON array:
/// an existing array is flattened, a lone value is wrapped.
pub fn merged_payload(older: Value, newer: Value) -> Value {
    let mut items = match older {
        Value::Array(items) => items,
        other => vec![other],
    };
    items.push(newer);
    Value::Array(items)
}
