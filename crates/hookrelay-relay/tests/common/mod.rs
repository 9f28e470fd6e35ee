//! Common test utilities for relay integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use hookrelay_relay::{relay_router, LivenessProbe, RelayConfig, RelayState, ServiceEndpoint};

/// Relay config pointed at loopback so wiremock downstreams are reachable.
pub fn test_config() -> RelayConfig {
    let mut config = RelayConfig::new(8400).unwrap();
    config.client_host = "127.0.0.1".to_string();
    config
}

/// Probe stub with a fixed answer.
pub struct StaticProbe(pub bool);

#[async_trait]
impl LivenessProbe for StaticProbe {
    async fn is_up(&self, _endpoint: &ServiceEndpoint) -> bool {
        self.0
    }
}

/// Serve a relay state on an ephemeral loopback port.
pub async fn spawn_relay(state: RelayState) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = relay_router(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Relay state with the production HTTP probe.
pub fn http_probe_state() -> RelayState {
    RelayState::new(&test_config()).unwrap()
}

/// Relay state with a stubbed probe outcome.
pub fn stub_probe_state(up: bool) -> RelayState {
    RelayState::with_probe(&test_config(), Arc::new(StaticProbe(up))).unwrap()
}
