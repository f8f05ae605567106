//! support-agent server binary
//!
//! Serves the human-in-the-loop chat API. Configuration comes from
//! `support-agent.toml` (see `ServerConfig::load`) with `HOST` / `PORT`
//! overrides.

use anyhow::Context;
use std::sync::Arc;
use support_agent::{build_workflow, create_router, open_store, AppState, ReplyModel, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing/logging
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    tracing::info!("Loading server configuration...");
    let config = ServerConfig::load().context("failed to load support-agent configuration")?;
    tracing::info!("Store backend: {:?}", config.store.backend);

    let addr = config.socket_addr()?;

    let (saver, database_path) = open_store(&config.store)
        .await
        .context("failed to open checkpoint store")?;
    if let Some(path) = &database_path {
        tracing::info!("Database Path: {}", path);
    }

    let reply_model = match config.llm_config()? {
        Some(llm_config) => {
            let client = llm::OpenAiClient::new(llm_config).context("failed to build chat model client")?;
            tracing::info!("Chat model enabled: {}", config.model.model);
            Some(ReplyModel {
                model: Arc::new(client),
                temperature: config.model.temperature,
            })
        }
        None => {
            tracing::info!("Chat model disabled, replies are fixed acknowledgements");
            None
        }
    };

    let graph = build_workflow(saver.clone(), reply_model).context("failed to compile workflow")?;

    let mut app_state = AppState::new(graph, saver);
    if let Some(path) = database_path {
        app_state = app_state.with_database_path(path);
    }

    tracing::info!("Building API router");
    let app = create_router(app_state);

    tracing::info!("Starting support-agent server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    // Run server with graceful shutdown
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("support-agent server shut down gracefully");
    Ok(())
}

/// Signal for graceful shutdown (Ctrl-C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install CTRL-C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received CTRL-C signal, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, shutting down");
        }
    }
}
