//! Shared service state: the name-to-endpoint mapping plus the single-slot
//! pending delivery buffer, behind per-name locks.
//!
//! `register`, `revoke`, `enqueue` and `take` are atomic with respect to each
//! other for the same service name; unrelated services never contend. Callers
//! must not hold a slot across outbound I/O: read, release, forward, then
//! commit the outcome.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::delivery::{merged_payload, Delivery};

/// One downstream service's current reachable address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub host: String,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Per-service state: the registered endpoint (if the service is live) and
/// the buffered delivery (if any).
#[derive(Debug, Default)]
struct Slot {
    endpoint: Option<ServiceEndpoint>,
    queued: Option<Delivery>,
}

/// State container for all known services, keyed by name.
#[derive(Debug, Default)]
pub struct ServiceTable {
    slots: RwLock<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl ServiceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the slot for a service name.
    async fn slot(&self, name: &str) -> Arc<Mutex<Slot>> {
        {
            let slots = self.slots.read().await;
            if let Some(slot) = slots.get(name) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(name.to_string()).or_default())
    }

    /// Register (or re-register) an endpoint for a name, overwriting any
    /// previous one. Returns the endpoint that was replaced, if any.
    pub async fn register(&self, name: &str, endpoint: ServiceEndpoint) -> Option<ServiceEndpoint> {
        let slot = self.slot(name).await;
        let mut slot = slot.lock().await;
        slot.endpoint.replace(endpoint)
    }

    /// Current endpoint for a name, if the service is live.
    pub async fn lookup(&self, name: &str) -> Option<ServiceEndpoint> {
        let slots = self.slots.read().await;
        let slot = slots.get(name)?.clone();
        drop(slots);
        let endpoint = slot.lock().await.endpoint.clone();
        endpoint
    }

    /// Remove the endpoint for a name. Idempotent; the queued delivery, if
    /// any, is kept for a later flush.
    pub async fn revoke(&self, name: &str) {
        let slots = self.slots.read().await;
        let Some(slot) = slots.get(name).cloned() else {
            return;
        };
        drop(slots);
        slot.lock().await.endpoint = None;
    }

    /// Buffer a delivery for a name. If the slot is already occupied, the two
    /// payloads are folded into a JSON array and the NEWEST delivery's origin
    /// metadata wins. Older data beyond the merged array is quietly dropped;
    /// the buffer never grows past one entry per service.
    pub async fn enqueue(&self, name: &str, mut delivery: Delivery) {
        let slot = self.slot(name).await;
        let mut slot = slot.lock().await;
        if let Some(queued) = slot.queued.take() {
            delivery.payload = merged_payload(queued.payload, delivery.payload);
        }
        slot.queued = Some(delivery);
    }

    /// Atomically remove and return the buffered delivery for a name.
    pub async fn take(&self, name: &str) -> Option<Delivery> {
        let slots = self.slots.read().await;
        let slot = slots.get(name)?.clone();
        drop(slots);
        let queued = slot.lock().await.queued.take();
        queued
    }
}
