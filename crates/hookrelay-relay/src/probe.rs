//! Liveness probe used to validate a registration claim before trusting it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::error::RelayError;
use crate::table::ServiceEndpoint;

/// Capability to check whether a candidate endpoint is actually up.
///
/// A trait seam so registration handling can be exercised without a live
/// downstream service.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn is_up(&self, endpoint: &ServiceEndpoint) -> bool;
}

/// Production probe: `GET http://{host}:{port}/ping` with a short timeout,
/// accepting only a 200 response.
pub struct HttpLivenessProbe {
    client: Client,
}

impl HttpLivenessProbe {
    /// # Errors
    ///
    /// Returns `RelayError::Internal` if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("hookrelay-probe/0.1")
            .build()
            .map_err(|e| RelayError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for HttpLivenessProbe {
    async fn is_up(&self, endpoint: &ServiceEndpoint) -> bool {
        let url = format!("{}/ping", endpoint.base_url());
        match self.client.get(&url).send().await {
            Ok(response) => response.status() == StatusCode::OK,
            Err(err) => {
                tracing::debug!(%url, error = %err, "liveness probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint_for(server: &MockServer) -> ServiceEndpoint {
        let addr = server.address();
        ServiceEndpoint::new(addr.ip().to_string(), addr.port())
    }

    #[tokio::test]
    async fn test_probe_accepts_200_ping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"isUp": true})))
            .mount(&server)
            .await;

        let probe = HttpLivenessProbe::new(Duration::from_secs(1)).unwrap();
        assert!(probe.is_up(&endpoint_for(&server)).await);
    }

    #[tokio::test]
    async fn test_probe_rejects_non_200_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ping"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let probe = HttpLivenessProbe::new(Duration::from_secs(1)).unwrap();
        assert!(!probe.is_up(&endpoint_for(&server)).await);
    }

    #[tokio::test]
    async fn test_probe_rejects_unreachable_endpoint() {
        // Bind then drop a listener so the port is (very likely) closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = HttpLivenessProbe::new(Duration::from_secs(1)).unwrap();
        assert!(!probe.is_up(&ServiceEndpoint::new("127.0.0.1", port)).await);
    }
}
