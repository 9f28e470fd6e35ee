//! Inbound events and the listener API applications implement.

use serde_json::Value;

use crate::sender::ClassifiedSender;

/// A single forwarded webhook.
#[derive(Debug, Clone)]
pub struct WebhookReceiveEvent {
    pub sender: ClassifiedSender,
    /// `Authorization` header of the forwarded request, if any.
    pub authorization: Option<String>,
    /// Original sender's IP as reported by the relay's `Sent-By` header.
    pub origin_ip: Option<String>,
    pub payload: Value,
}

/// A batch of webhooks delivered as one array, produced when the relay
/// flushes merged buffered deliveries.
#[derive(Debug, Clone)]
pub struct WebhookBatchReceiveEvent {
    pub sender: ClassifiedSender,
    pub authorization: Option<String>,
    pub origin_ip: Option<String>,
    pub webhooks: Vec<Value>,
}

/// The two shapes a forwarded delivery can take. Exhaustively matched at the
/// dispatch site, so an unexpected kind cannot exist at runtime.
#[derive(Debug, Clone)]
pub enum InboundEvent {
    Single(WebhookReceiveEvent),
    Batch(WebhookBatchReceiveEvent),
}

/// Application callbacks for forwarded webhooks. Both methods default to
/// no-ops so implementors can override only what they consume.
pub trait WebhookListener: Send + Sync {
    /// Fired once per received webhook. In non-batch mode this also fires
    /// once per element of a forwarded batch.
    fn on_webhook(&self, _event: &WebhookReceiveEvent) {}

    /// Fired for a forwarded batch when batch mode is configured.
    fn on_batch(&self, _event: &WebhookBatchReceiveEvent) {}
}
