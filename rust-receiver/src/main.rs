//! Squarehook Web Server - Square payment webhook receiver.
//!
//! This binary:
//! 1. Receives Square notifications and verifies their signatures
//! 2. Fetches each updated payment from the Connect API
//! 3. Appends the payment to the day's CSV export
//!
//! Notifications that can never be handled are acknowledged with 200 so
//! Square stops redelivering them; transient failures return 5xx.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use squarehook::web::{router, AppState, WEBHOOK_PATH};
use squarehook::{
    Config, ConnectClient, DailyCsvSink, RetryingFetcher, SignatureVerifier, WebhookProcessor,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        port = config.port,
        webhook_url = %config.webhook_url,
        connect_host = %config.connect_host,
        signature_algorithm = %config.signature_algorithm,
        export_dir = %config.export_dir.display(),
        fetch_max_attempts = config.fetch_max_attempts,
        "config_loaded"
    );

    // Connect API client, retried according to configuration
    let client = ConnectClient::new(
        config.connect_host.clone(),
        config.square_access_token.clone(),
        Duration::from_millis(config.request_timeout_ms),
    )
    .context("Failed to create HTTP client")?;
    let fetcher = RetryingFetcher::new(
        client,
        config.fetch_max_attempts,
        config.fetch_retry_delay_ms,
    );

    // Daily CSV export
    tokio::fs::create_dir_all(&config.export_dir)
        .await
        .context("Failed to create export directory")?;
    let sink = DailyCsvSink::new(config.export_dir.clone());
    info!(export_dir = %sink.dir().display(), "csv_sink_ready");

    let verifier = SignatureVerifier::new(
        config.webhook_signature_key.clone(),
        config.webhook_url.clone(),
        config.signature_algorithm,
    );

    let processor = WebhookProcessor::new(verifier, Arc::new(fetcher), Arc::new(sink));
    let app = router(AppState::new(processor));

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, path = WEBHOOK_PATH, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}
