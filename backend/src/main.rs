//! HTTP API server for the Pressroom blog.

mod article_form;
mod auth;
mod client_ip;
mod config;
mod error;
mod handlers;
mod media;
mod request_context;
mod routes;
mod state;

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use pressroom_shared::BlogStore;
use tracing_subscriber::EnvFilter;

use crate::{config::Config, media::LocalMediaStorage, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Starting Pressroom backend server");
    tracing::info!("Database: {}", config.database_url);
    tracing::info!("Media directory: {}", config.media_dir.display());

    let store = BlogStore::connect(&config.database_url, config.db_max_connections).await?;
    let media = Arc::new(LocalMediaStorage::new(&config.media_dir, &config.media_base_url));
    let app_state = AppState::new(store.clone(), media);

    let app = routes::create_router(app_state, &config.media_dir);

    let addr = config.listen_addr();
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.pool().close().await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(err) => {
                tracing::error!("failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
