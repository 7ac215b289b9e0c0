//! Helper functions for store module

use crate::error::Error;
use crate::record::ExecutionRecord;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Convert a SQLite row to an ExecutionRecord
pub(crate) fn row_to_record(row: SqliteRow) -> Result<ExecutionRecord, Error> {
    let created_at_str: String = row.get("created_at");
    let finished_at_str: Option<String> = row.get("finished_at");

    let created_at = parse_timestamp(&created_at_str)?;
    let finished_at = finished_at_str
        .map(|s| parse_timestamp(&s))
        .transpose()?;

    Ok(ExecutionRecord {
        id: row.get("id"),
        command: row.get("command"),
        status: row.get("status"),
        output: row.get("output"),
        created_at,
        finished_at,
    })
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Serialization(format!("invalid timestamp: {e}")))
}

/// Get the default data directory for webconsole
pub fn default_data_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .map(|p| p.join(".webconsole"))
        .unwrap_or_else(|| std::path::PathBuf::from(".webconsole"))
}

/// File name of the database inside a data directory
pub const DB_FILE_NAME: &str = "webconsole.sqlite3";

/// Get the default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_data_dir().join(DB_FILE_NAME)
}
