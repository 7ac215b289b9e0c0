//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = Config::builder()
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            File::with_name(&format!(
                "config/{}",
                std::env::var("WEBCONSOLE_ENV").unwrap_or_else(|_| "development".to_string())
            ))
            .required(false),
        )
        .add_source(File::with_name("config/local").required(false))
        // WEBCONSOLE_SERVER__PORT, not WEBCONSOLE__SERVER__PORT
        .add_source(
            Environment::with_prefix("WEBCONSOLE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_defaults_deserialize() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.server.static_dir.is_none());
        assert!(config.data_dir.is_none());
        assert_eq!(config.runner.shell, "bash");
        assert_eq!(config.runner.shell_args, vec!["-c"]);
        assert_eq!(config.runner.read_buffer_size, 4096);
        assert_eq!(config.console.frame_buffer, 64);
    }

    #[test]
    fn test_db_path_follows_data_dir() {
        let config = AppConfig {
            data_dir: Some("/tmp/webconsole-data".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(
            config.db_path(),
            std::path::PathBuf::from("/tmp/webconsole-data/webconsole.sqlite3")
        );
        assert_eq!(
            AppConfig::default().db_path(),
            webconsole_store::default_db_path()
        );
    }
}
