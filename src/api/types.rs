//! Request and response types for the HTTP API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use webconsole_store::{ExecutionId, ExecutionRecord, ExecutionState};

/// Standard JSON envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// An execution record as returned to clients
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionView {
    pub id: ExecutionId,
    pub command: String,
    pub state: ExecutionState,
    /// `null` while the command is running
    pub status: Option<i32>,
    pub output: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<ExecutionRecord> for ExecutionView {
    fn from(record: ExecutionRecord) -> Self {
        Self {
            output: record.output_lossy(),
            state: record.state(),
            id: record.id,
            command: record.command,
            status: record.status,
            created_at: record.created_at,
            finished_at: record.finished_at,
        }
    }
}

/// Form posted to submit a command
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub command: String,
}

/// Query parameters for listing executions
#[derive(Debug, Deserialize)]
pub struct ListExecutionsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_envelope() {
        let ok = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "data": 3}));

        let err = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(err, serde_json::json!({"success": false, "error": "nope"}));
    }

    #[test]
    fn test_pending_view_has_null_status() {
        let view = ExecutionView::from(ExecutionRecord {
            id: 1,
            command: "sleep 10".to_string(),
            status: None,
            output: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        });
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["state"], "pending");
        assert_eq!(json["status"], serde_json::Value::Null);
        assert_eq!(json["output"], "");
    }

    #[test]
    fn test_list_query_default_limit() {
        let query: ListExecutionsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, 50);
    }
}
