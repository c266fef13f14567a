use std::sync::Arc;

use anyhow::Context;
use trivia_rounds::{
    config::Config,
    create_router,
    services::AppState,
    telemetry::{self, LogTarget},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    let telemetry = telemetry::init(
        "trivia-dev-backend",
        config.log_format,
        "trivia_rounds=debug,tower_http=debug",
        LogTarget::Stdout,
    )?;

    tracing::info!("Starting trivia dev backend");

    let bind_addr = config.bind_addr.clone();
    let app_state = Arc::new(AppState::new(config).context("Failed to initialize application state")?);
    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
