//! Executions API endpoints
//!
//! POST /executions - Submit a command
//! GET /executions - List recent executions
//! GET /executions/:id - Get an execution (optional `.json` suffix)

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Form, Json, Router,
};
use tracing::info;

use webconsole_core::{ConsoleService, Error, ExecutionId};

use super::error::ApiError;
use super::types::{ApiResponse, ExecutionView, ListExecutionsQuery, SubmitForm};

/// Parse an execution id path segment, accepting a `.json` suffix
pub(crate) fn parse_execution_id(raw: &str) -> Result<ExecutionId, ApiError> {
    let trimmed = raw.strip_suffix(".json").unwrap_or(raw);
    trimmed
        .parse()
        .map_err(|_| ApiError::NotFound(raw.to_string()))
}

/// Start a command and redirect to its record
pub async fn submit_execution(
    Extension(service): Extension<Arc<ConsoleService>>,
    Form(form): Form<SubmitForm>,
) -> Result<impl IntoResponse, ApiError> {
    let id = service.runner().start(&form.command).await?;
    info!(execution_id = id, "Accepted command");

    Ok((
        StatusCode::FOUND,
        [(header::LOCATION, format!("/executions/{id}"))],
    ))
}

/// Current state of an execution
pub async fn get_execution(
    Extension(service): Extension<Arc<ConsoleService>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ApiResponse<ExecutionView>>, ApiError> {
    let id = parse_execution_id(&raw_id)?;
    let record = service
        .store()
        .get(id)
        .await?
        .ok_or(Error::NotFound(id))?;

    Ok(Json(ApiResponse::success(record.into())))
}

/// Most recent executions, newest first
pub async fn list_executions(
    Extension(service): Extension<Arc<ConsoleService>>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<Json<ApiResponse<Vec<ExecutionView>>>, ApiError> {
    let limit = query.limit.clamp(1, 200);
    let records = service.store().list_recent(limit).await?;

    Ok(Json(ApiResponse::success(
        records.into_iter().map(ExecutionView::from).collect(),
    )))
}

/// Create executions routes
pub fn executions_routes() -> Router {
    Router::new()
        .route("/executions", get(list_executions).post(submit_execution))
        .route("/executions/:id", get(get_execution))
}
