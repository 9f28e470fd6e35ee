//! Relay configuration loading and validation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RelayError, RelayResult};

/// Ports below this are reserved for the host system and rejected everywhere
/// a port is accepted as configuration.
pub const MIN_SERVICE_PORT: u16 = 2000;

/// Root relay configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayConfig {
    /// Address the relay binds its own listener to.
    #[serde(default = "default_bind_host")]
    pub bind_host: String,
    /// Port the relay listens on.
    pub port: u16,
    /// Host downstream clients are probed and forwarded to. Clients register
    /// a port only; they are expected to run next to the relay.
    #[serde(default = "default_client_host")]
    pub client_host: String,
    /// Liveness probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
    /// Connect timeout for delivery forwards, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Overall timeout for delivery forwards, in milliseconds.
    #[serde(default = "default_forward_timeout_ms")]
    pub forward_timeout_ms: u64,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_client_host() -> String {
    "localhost".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    1000
}

fn default_forward_timeout_ms() -> u64 {
    10_000
}

impl RelayConfig {
    /// Configuration with defaults for everything but the port.
    pub fn new(port: u16) -> RelayResult<Self> {
        let config = Self {
            bind_host: default_bind_host(),
            port,
            client_host: default_client_host(),
            probe_timeout_ms: default_probe_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            forward_timeout_ms: default_forward_timeout_ms(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RelayResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            RelayError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> RelayResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| RelayError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration for the relay process.
    ///
    /// Precedence: a CLI port argument, then `HOOKRELAY_CONFIG` (YAML file
    /// path), then `HOOKRELAY_PORT`. Having none of them is a fatal
    /// configuration error. Env overrides are applied after file loading.
    pub fn load(port_arg: Option<String>) -> RelayResult<Self> {
        let mut config = if let Some(arg) = port_arg {
            let port = arg
                .parse()
                .map_err(|_| RelayError::Config(format!("Failed to parse port, input: {arg}")))?;
            Self::new(port)?
        } else if let Ok(path) = std::env::var("HOOKRELAY_CONFIG") {
            Self::from_file(path)?
        } else if let Ok(port) = std::env::var("HOOKRELAY_PORT") {
            let port = port
                .parse()
                .map_err(|_| RelayError::Config(format!("Failed to parse port, input: {port}")))?;
            Self::new(port)?
        } else {
            return Err(RelayError::Config(
                "No port specified: pass a port argument, set HOOKRELAY_PORT, \
                 or point HOOKRELAY_CONFIG at a config file"
                    .to_string(),
            ));
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("HOOKRELAY_BIND_HOST") {
            self.bind_host = host;
        }
        if let Ok(host) = std::env::var("HOOKRELAY_CLIENT_HOST") {
            self.client_host = host;
        }
    }

    pub fn validate(&self) -> RelayResult<()> {
        if self.port < MIN_SERVICE_PORT {
            return Err(RelayError::Config(format!(
                "Port must be {MIN_SERVICE_PORT} or above, got {}",
                self.port
            )));
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.forward_timeout_ms)
    }
}
