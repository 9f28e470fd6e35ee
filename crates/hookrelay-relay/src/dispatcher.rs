//! Delivery dispatcher: forwards a payload to its service's registered
//! endpoint and feeds failure classification back into the service table.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use reqwest::Client;

use crate::delivery::Delivery;
use crate::error::RelayError;
use crate::table::{ServiceEndpoint, ServiceTable};

/// Outcome of a dispatch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Forwarded and accepted downstream.
    Delivered,
    /// Buffered for a later flush: no live endpoint, or the forward failed at
    /// the transport level.
    Queued,
    /// The downstream service actively rejected the payload. Not buffered and
    /// not retried.
    Rejected,
}

pub struct DeliveryDispatcher {
    table: Arc<ServiceTable>,
    client: Client,
}

impl DeliveryDispatcher {
    /// # Errors
    ///
    /// Returns `RelayError::Internal` if the HTTP client cannot be built.
    pub fn new(
        table: Arc<ServiceTable>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, RelayError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { table, client })
    }

    /// Forward a delivery to a named service, or buffer it.
    ///
    /// Locks are never held across the forward: the endpoint is read and
    /// cloned, then the outcome (revocation, re-buffering) is committed after
    /// the I/O completes.
    pub async fn dispatch(&self, service: &str, delivery: Delivery) -> DispatchOutcome {
        let Some(endpoint) = self.table.lookup(service).await else {
            tracing::warn!(
                service,
                delivery_id = %delivery.id,
                "got webhook for non-active service, queueing delivery"
            );
            self.table.enqueue(service, delivery).await;
            return DispatchOutcome::Queued;
        };
        self.forward(service, &endpoint, delivery).await
    }

    /// Flush the buffered delivery for a service, if any.
    ///
    /// Returns the dispatch outcome, or `None` when nothing was buffered. A
    /// `Rejected` outcome is terminal here (the buffered entry is already
    /// consumed) while a `Queued` outcome has re-buffered it.
    pub async fn flush_queued(&self, service: &str) -> Option<DispatchOutcome> {
        let delivery = self.table.take(service).await?;
        tracing::info!(service, delivery_id = %delivery.id, "flushing queued delivery");
        Some(self.dispatch(service, delivery).await)
    }

    async fn forward(
        &self,
        service: &str,
        endpoint: &ServiceEndpoint,
        delivery: Delivery,
    ) -> DispatchOutcome {
        let route = if delivery.is_batch() { "/batch" } else { "/" };
        let url = format!("{}{}", endpoint.base_url(), route);
        tracing::info!(service, delivery_id = %delivery.id, %url, "forwarding delivery");

        let mut request = self
            .client
            .post(&url)
            .header(USER_AGENT, delivery.origin_user_agent.as_str())
            .header("Sent-By", delivery.origin_ip.as_str())
            .json(&delivery.payload);
        if let Some(auth) = &delivery.origin_authorization {
            request = request.header(AUTHORIZATION, auth.as_str());
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(
                    service,
                    delivery_id = %delivery.id,
                    status = response.status().as_u16(),
                    "delivery forwarded"
                );
                DispatchOutcome::Delivered
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                tracing::error!(
                    service,
                    delivery_id = %delivery.id,
                    status,
                    response_body = %body,
                    payload = %delivery.payload,
                    "downstream service rejected the delivery"
                );
                DispatchOutcome::Rejected
            }
            Err(err) if err.is_connect() => {
                tracing::error!(
                    service,
                    delivery_id = %delivery.id,
                    error = %err,
                    "endpoint unreachable, revoking registration and queueing delivery"
                );
                self.table.revoke(service).await;
                self.table.enqueue(service, delivery).await;
                DispatchOutcome::Queued
            }
            Err(err) => {
                tracing::error!(
                    service,
                    delivery_id = %delivery.id,
                    error = %err,
                    "forward failed, queueing delivery"
                );
                self.table.enqueue(service, delivery).await;
                DispatchOutcome::Queued
            }
        }
    }
}
