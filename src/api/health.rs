//! Health check endpoint

use std::sync::Arc;

use axum::{extract::Extension, response::Json, routing::get, Router};
use serde::Serialize;
use webconsole_core::ConsoleService;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub live_executions: usize,
}

async fn health_check(Extension(service): Extension<Arc<ConsoleService>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        live_executions: service.registry().len().await,
    })
}

/// Create health routes
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}
