//! Chunkwise API server

use chunkwise_api::{bootstrap, routes};
use tracing::info;
use tracing_subscriber::EnvFilter;

type MainResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() -> MainResult {
    chunkwise_common::initialize_environment();

    let config = bootstrap::load_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.telemetry.tracing_level)),
        )
        .init();

    info!("Starting chunkwise API server...");
    info!("Configuration loaded: {:?}", config);

    let state = bootstrap::initialize_app_state(&config)?;
    let app = routes::create_router(state);

    let addr = config.api.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
