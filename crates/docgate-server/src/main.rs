//! docgate-server - REST API server binary.

use docgate_extractors::{ChatConfig, ExtractorRegistry, VisionConfig};
use docgate_server::{
    config::{LogFormat, ServerConfig},
    create_server, AppState,
};
use tokio::signal;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn init_tracing(format: LogFormat) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::from_default_env()
        .add_directive(Level::INFO.into())
        .add_directive("docgate_server=debug".parse()?);

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ServerConfig::from_env()?;
    init_tracing(config.log_format)?;

    if config.api_tokens.is_empty() {
        warn!("DOCGATE_API_TOKENS is empty; every /api request will be rejected");
    }

    let chat = ChatConfig::from_env();
    if chat.api_key.is_none() {
        warn!("No OpenAI key configured; structured data extraction will fail");
    }
    let registry = ExtractorRegistry::with_defaults(chat, VisionConfig::from_env());

    let state = AppState::from_config(&config, registry);
    info!(
        workers = config.workers,
        timeout_secs = config.backend_timeout.map(|t| t.as_secs()),
        max_upload_bytes = config.max_upload_bytes,
        "Worker pool started"
    );

    let app = create_server(state);

    let addr = config.bind_addr()?;
    info!("Starting docgate-server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, draining requests...");
        })
        .await?;

    info!("Server stopped cleanly");
    Ok(())
}
