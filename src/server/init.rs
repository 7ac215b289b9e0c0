//! Server initialization and run loop

use super::config::{AppConfig, ConsoleConfig};
use super::loader::load_config;
use anyhow::{Context, Result};
use axum::{routing::get, Extension, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;
use webconsole_core::ConsoleService;
use webconsole_store::ExecutionStore;

/// Open the store and wire up the console service
pub async fn build_service(config: &AppConfig) -> Result<Arc<ConsoleService>> {
    let db_path = config.db_path();
    let store = ExecutionStore::from_path(&db_path)
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    Ok(Arc::new(ConsoleService::new(
        Arc::new(store),
        config.runner.clone(),
    )))
}

/// Assemble the HTTP router
pub fn build_router(
    service: Arc<ConsoleService>,
    console: ConsoleConfig,
    static_dir: Option<&str>,
) -> Router {
    let app = Router::new()
        .merge(crate::api::health_routes())
        .merge(crate::api::api_router())
        .layer(Extension(service))
        .layer(Extension(console))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    match static_dir {
        Some(dir) if std::path::Path::new(dir).is_dir() => {
            info!("Serving static files from {}", dir);
            app.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        _ => app.route("/", get(|| async { "webconsole" })),
    }
}

/// Run the HTTP server until Ctrl+C or SIGTERM
pub async fn run() -> Result<()> {
    let config = load_config()?;
    info!("Starting webconsole v{}", env!("CARGO_PKG_VERSION"));

    let service = build_service(&config).await?;
    let app = build_router(
        service,
        config.console.clone(),
        config.server.static_dir.as_deref(),
    );

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("webconsole shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
