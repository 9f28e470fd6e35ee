//! Client configuration with documented defaults.

use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Default cap on handshake retries after the initial attempt.
pub const DEFAULT_MAX_CONNECTION_ATTEMPTS: u32 = 3;

/// Default first retry delay; doubled after every failed attempt.
pub const DEFAULT_STARTING_RETRY_TIME: Duration = Duration::from_millis(2000);

/// Ports below this are reserved for the host system and rejected.
pub const MIN_LISTEN_PORT: u16 = 2000;

/// Configuration for a [`RelayClient`](crate::RelayClient).
///
/// Defaults: `max_connection_attempts = 3`, `starting_retry_time = 2000 ms`,
/// batch mode off.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the relay, without a trailing slash.
    pub relay_url: String,
    /// Name this service registers under.
    pub service_name: String,
    /// Local port the intake listener binds and announces to the relay.
    pub port: u16,
    /// Consume forwarded batches as a unit instead of expanding them into
    /// per-element single events.
    pub use_batch: bool,
    /// Handshake retries after the initial attempt before giving up.
    pub max_connection_attempts: u32,
    /// First handshake retry delay; doubled after every network failure.
    pub starting_retry_time: Duration,
}

impl ClientConfig {
    /// # Errors
    ///
    /// Returns `ClientError::Config` on an empty relay URL or service name,
    /// or a port below [`MIN_LISTEN_PORT`].
    pub fn new(
        relay_url: impl Into<String>,
        service_name: impl Into<String>,
        port: u16,
    ) -> ClientResult<Self> {
        let relay_url = relay_url.into();
        let service_name = service_name.into();
        if relay_url.trim().is_empty() {
            return Err(ClientError::Config(
                "The relay URL must not be empty!".to_string(),
            ));
        }
        if service_name.trim().is_empty() {
            return Err(ClientError::Config(
                "The service name must not be empty!".to_string(),
            ));
        }
        if port < MIN_LISTEN_PORT {
            return Err(ClientError::Config(format!(
                "The port must be {MIN_LISTEN_PORT} or above, got {port}"
            )));
        }
        Ok(Self {
            relay_url: relay_url.trim_end_matches('/').to_string(),
            service_name,
            port,
            use_batch: false,
            max_connection_attempts: DEFAULT_MAX_CONNECTION_ATTEMPTS,
            starting_retry_time: DEFAULT_STARTING_RETRY_TIME,
        })
    }

    /// Consume forwarded batches as one batch event instead of expanding
    /// them into single events.
    pub fn with_use_batch(mut self, use_batch: bool) -> Self {
        self.use_batch = use_batch;
        self
    }

    /// Set the handshake retry cap.
    pub fn with_max_connection_attempts(mut self, attempts: u32) -> Self {
        self.max_connection_attempts = attempts;
        self
    }

    /// Set the first handshake retry delay.
    pub fn with_starting_retry_time(mut self, delay: Duration) -> Self {
        self.starting_retry_time = delay;
        self
    }
}
