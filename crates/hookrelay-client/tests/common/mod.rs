//! Common test utilities for client integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use hookrelay_client::router::{client_router, IntakeState};
use hookrelay_client::{
    WebhookBatchReceiveEvent, WebhookListener, WebhookReceiveEvent,
};

/// Listener that records every event it sees.
#[derive(Default)]
pub struct CollectingListener {
    singles: Mutex<Vec<WebhookReceiveEvent>>,
    batches: Mutex<Vec<WebhookBatchReceiveEvent>>,
}

impl CollectingListener {
    pub fn singles(&self) -> Vec<WebhookReceiveEvent> {
        self.singles.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<WebhookBatchReceiveEvent> {
        self.batches.lock().unwrap().clone()
    }
}

impl WebhookListener for CollectingListener {
    fn on_webhook(&self, event: &WebhookReceiveEvent) {
        self.singles.lock().unwrap().push(event.clone());
    }

    fn on_batch(&self, event: &WebhookBatchReceiveEvent) {
        self.batches.lock().unwrap().push(event.clone());
    }
}

/// Serve an intake router on an ephemeral loopback port, returning the
/// address and the recording listener.
pub async fn spawn_intake(use_batch: bool) -> (SocketAddr, Arc<CollectingListener>) {
    let collector = Arc::new(CollectingListener::default());
    let state = IntakeState::new(
        vec![Arc::clone(&collector) as Arc<dyn WebhookListener>],
        use_batch,
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = client_router(state);
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    (addr, collector)
}
