use std::sync::Arc;

use anyhow::Context;

use crate::app::{app, AppState};
use crate::cli::open_store;
use crate::config::AppConfig;
use crate::services::LogMailer;

pub async fn handle(mut config: AppConfig, port: Option<u16>) -> anyhow::Result<()> {
    if let Some(port) = port {
        config.api.port = port;
    }
    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set in {:?} mode", config.environment);
    }

    let store = open_store(&config).await?;
    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        "Cardstack API listening on http://{} ({:?}, {} store)",
        bind_addr,
        config.environment,
        store.backend()
    );

    let state = AppState::new(config, store.clone(), Arc::new(LogMailer));
    let served = axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;
    served.context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
