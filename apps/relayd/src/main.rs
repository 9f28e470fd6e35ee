use std::net::SocketAddr;

use tracing_subscriber::EnvFilter;

use hookrelay_relay::{relay_router, RelayConfig, RelayState};

#[tokio::main]
async fn main() {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hookrelay_relay=debug")),
        )
        .init();

    // Load configuration: CLI port argument, or HOOKRELAY_CONFIG /
    // HOOKRELAY_PORT from the environment
    let config = RelayConfig::load(std::env::args().nth(1)).unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        std::process::exit(1);
    });

    let state = RelayState::new(&config).unwrap_or_else(|e| {
        eprintln!("Startup error: {e}");
        std::process::exit(1);
    });

    let addr = format!("{}:{}", config.bind_host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap_or_else(|e| {
        eprintln!("Failed to bind {addr}: {e}");
        std::process::exit(1);
    });

    tracing::info!(%addr, "relay started, waiting for services");

    axum::serve(
        listener,
        relay_router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap_or_else(|e| {
        eprintln!("Server error: {e}");
        std::process::exit(1);
    });
}
