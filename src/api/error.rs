//! Mapping of service errors onto HTTP responses

use super::types::ApiResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;
use webconsole_core::Error;

/// Error returned by API handlers
#[derive(Debug)]
pub enum ApiError {
    /// Path did not name an execution
    NotFound(String),
    /// Service failure
    Service(Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Service(Error::EmptyCommand) => StatusCode::BAD_REQUEST,
            Self::Service(Error::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(Error::NotIncremental) => StatusCode::PRECONDITION_FAILED,
            Self::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self::Service(e)
    }
}

impl From<webconsole_store::Error> for ApiError {
    fn from(e: webconsole_store::Error) -> Self {
        Self::Service(Error::Store(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::NotFound(what) => format!("execution not found: {what}"),
            Self::Service(e) => e.to_string(),
        };
        if status.is_server_error() {
            error!("Request failed: {}", message);
        }
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}
