//! Registration handshake: announce this service's intake port to the relay,
//! with exponential backoff on network failure.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::json;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// How one registration attempt failed.
enum AttemptFailure {
    /// The relay answered with a non-success status. Terminal: e.g. the
    /// relay-side liveness probe failed, and retrying blindly will not help.
    Rejected(u16),
    /// The relay could not be reached at all.
    Network(reqwest::Error),
}

/// The retry delays for a given starting delay and retry cap: doubled after
/// every failure. Pure so the schedule is testable without sleeping.
pub fn retry_schedule(starting: Duration, max_attempts: u32) -> Vec<Duration> {
    let mut delays = Vec::with_capacity(max_attempts as usize);
    let mut delay = starting;
    for _ in 0..max_attempts {
        delays.push(delay);
        delay *= 2;
    }
    delays
}

pub struct RegistrationHandshake {
    config: ClientConfig,
    client: Client,
}

impl RegistrationHandshake {
    /// # Errors
    ///
    /// Returns `ClientError::Internal` if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("hookrelay-client/0.1")
            .build()
            .map_err(|e| ClientError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Run the handshake to completion.
    ///
    /// Network failures are retried with exponential backoff up to
    /// `max_connection_attempts` retries after the initial attempt. Both a
    /// relay rejection and backoff exhaustion are fatal to start-up; callers
    /// must terminate on them.
    pub async fn run(&self) -> ClientResult<()> {
        let mut attempts: u32 = 0;
        let mut delay = self.config.starting_retry_time;
        loop {
            match self.try_register().await {
                Ok(()) => {
                    tracing::info!(
                        service = %self.config.service_name,
                        port = self.config.port,
                        "registered with relay, waiting for webhooks"
                    );
                    return Ok(());
                }
                Err(AttemptFailure::Rejected(status)) => {
                    tracing::error!(
                        service = %self.config.service_name,
                        status,
                        "relay rejected the registration"
                    );
                    return Err(ClientError::RegistrationRejected { status });
                }
                Err(AttemptFailure::Network(err)) => {
                    if attempts >= self.config.max_connection_attempts {
                        tracing::error!(
                            service = %self.config.service_name,
                            attempts = attempts + 1,
                            "could not reach the relay, giving up"
                        );
                        return Err(ClientError::HandshakeExhausted {
                            attempts: attempts + 1,
                        });
                    }
                    tracing::warn!(
                        service = %self.config.service_name,
                        error = %err,
                        retry_ms = delay.as_millis() as u64,
                        "relay unreachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempts += 1;
                    delay *= 2;
                }
            }
        }
    }

    async fn try_register(&self) -> Result<(), AttemptFailure> {
        let url = format!(
            "{}/{}/init",
            self.config.relay_url, self.config.service_name
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({"port": self.config.port}))
            .send()
            .await
            .map_err(AttemptFailure::Network)?;

        if response.status() != StatusCode::OK {
            return Err(AttemptFailure::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}
