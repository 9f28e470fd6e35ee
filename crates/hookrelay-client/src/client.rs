//! Client lifecycle: bind the intake listener, run the registration
//! handshake, hand forwarded webhooks to listeners.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::event::WebhookListener;
use crate::handshake::RegistrationHandshake;
use crate::router::{client_router, IntakeState};

/// An embeddable relay client for one downstream service.
///
/// ```no_run
/// # use std::sync::Arc;
/// # use hookrelay_client::{ClientConfig, RelayClient, WebhookListener, WebhookReceiveEvent};
/// struct PrintListener;
///
/// impl WebhookListener for PrintListener {
///     fn on_webhook(&self, event: &WebhookReceiveEvent) {
///         println!("{} sent {}", event.sender.identity, event.payload);
///     }
/// }
///
/// # async fn run() -> Result<(), hookrelay_client::ClientError> {
/// let config = ClientConfig::new("http://localhost:8400", "demo", 9000)?;
/// let _handle = RelayClient::new(config)
///     .with_listener(Arc::new(PrintListener))
///     .start()
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct RelayClient {
    config: ClientConfig,
    listeners: Vec<Arc<dyn WebhookListener>>,
}

impl RelayClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            listeners: Vec::new(),
        }
    }

    /// Add a listener. All registered listeners see every event.
    pub fn with_listener(mut self, listener: Arc<dyn WebhookListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Bind the intake listener, spawn the server, then register with the
    /// relay.
    ///
    /// # Errors
    ///
    /// Fails on a bind error, on relay rejection, or on handshake
    /// exhaustion. The latter two are fatal to start-up; the embedding
    /// process is expected to terminate on them. The intake server is torn
    /// down before the error is returned.
    pub async fn start(self) -> ClientResult<RelayClientHandle> {
        let RelayClient { config, listeners } = self;

        let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
        let local_addr = listener.local_addr()?;

        let state = IntakeState::new(listeners, config.use_batch);
        let handshake = RegistrationHandshake::new(config)?;

        let router = client_router(state);
        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
        });
        tracing::info!(port = local_addr.port(), "started webhook intake listener");

        if let Err(err) = handshake.run().await {
            server.abort();
            return Err(err);
        }

        Ok(RelayClientHandle { local_addr, server })
    }
}

/// Handle to a running client: the bound intake address and the server task.
#[derive(Debug)]
pub struct RelayClientHandle {
    local_addr: SocketAddr,
    server: JoinHandle<std::io::Result<()>>,
}

impl RelayClientHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop serving the intake endpoint.
    pub fn shutdown(&self) {
        self.server.abort();
    }
}
