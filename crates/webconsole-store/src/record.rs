//! Record - the persisted execution record
//!
//! A record is created pending when a command is submitted and is finished
//! exactly once, when the subprocess exits. Finished records never change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to an execution by the store
pub type ExecutionId = i64;

/// Status recorded when the termination cause cannot be classified
/// (killed by a signal, or the exit status is unavailable).
///
/// Lies outside the 0..=255 range a process can exit with.
pub const UNKNOWN_EXIT_CODE: i32 = 1024;

/// Lifecycle state of an execution record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Subprocess still running, no status yet
    Pending,
    /// Subprocess exited, status and output are final
    Finished,
}

impl ExecutionState {
    /// Returns the string representation of the state
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single run of a submitted shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRecord {
    /// Unique identifier
    pub id: ExecutionId,

    /// Command text, line endings normalized
    pub command: String,

    /// Exit status; `None` while pending
    pub status: Option<i32>,

    /// Full captured stdout/stderr; empty until finished
    pub output: Vec<u8>,

    /// When the record was created
    pub created_at: DateTime<Utc>,

    /// When the subprocess finished
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExecutionRecord {
    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> ExecutionState {
        if self.status.is_some() {
            ExecutionState::Finished
        } else {
            ExecutionState::Pending
        }
    }

    /// Whether the subprocess has exited and the record is final
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state() == ExecutionState::Finished
    }

    /// Captured output decoded as UTF-8, invalid sequences replaced
    #[must_use]
    pub fn output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: Option<i32>) -> ExecutionRecord {
        ExecutionRecord {
            id: 1,
            command: "echo hi".to_string(),
            status,
            output: Vec::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    #[test]
    fn test_state_follows_status() {
        assert_eq!(record(None).state(), ExecutionState::Pending);
        assert_eq!(record(Some(0)).state(), ExecutionState::Finished);
        assert!(record(Some(UNKNOWN_EXIT_CODE)).is_finished());
    }

    #[test]
    fn test_output_lossy() {
        let mut r = record(Some(0));
        r.output = vec![b'h', b'i', 0xff, b'\n'];
        assert_eq!(r.output_lossy(), "hi\u{fffd}\n");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&ExecutionState::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        assert_eq!(ExecutionState::Finished.to_string(), "finished");
    }
}
