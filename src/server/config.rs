//! Server configuration types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use webconsole_core::RunnerConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    /// Directory holding the database; `~/.webconsole` when unset
    #[serde(default)]
    pub data_dir: Option<String>,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
}

impl AppConfig {
    /// Path of the SQLite database file
    pub fn db_path(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => PathBuf::from(dir).join(webconsole_store::DB_FILE_NAME),
            None => webconsole_store::default_db_path(),
        }
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: None,
        }
    }
}

/// Viewer stream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default = "default_frame_buffer")]
    pub frame_buffer: usize,
}

fn default_frame_buffer() -> usize {
    64
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            frame_buffer: default_frame_buffer(),
        }
    }
}
