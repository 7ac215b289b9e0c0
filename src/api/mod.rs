//! Web API module for webconsole
//!
//! Provides endpoints for:
//! - Command submission and execution records
//! - Live console streaming (SSE)
//! - Health checks

pub mod console;
pub mod error;
pub mod executions;
pub mod health;
pub mod types;

#[cfg(test)]
mod tests;

use axum::Router;

pub use console::console_routes;
pub use executions::executions_routes;
pub use health::health_routes;

/// Create the API router with all execution endpoints
pub fn api_router() -> Router {
    Router::new()
        .merge(executions_routes())
        .merge(console_routes())
}
