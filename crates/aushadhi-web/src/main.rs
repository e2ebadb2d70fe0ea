//! AushadhiAI API server
//!
//! Run with: cargo run -p aushadhi-web

use tracing::info;
use tracing_subscriber::EnvFilter;

use aushadhi_config::Settings;
use aushadhi_web::{router::build_router, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aushadhi=debug,tower_http=debug,info")),
        )
        .init();

    info!("Starting AushadhiAI API...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    info!(
        "Configuration loaded. env: {}, rendering: {}, origins: {:?}",
        settings.api.env, settings.render.enabled, settings.cors.allowed_origins
    );

    let addr = settings.bind_addr();
    let state = AppState::from_settings(settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
