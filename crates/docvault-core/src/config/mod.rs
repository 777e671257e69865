//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every section falls back to its defaults when absent.

pub mod activity;
pub mod auth;
pub mod logging;
pub mod notification;
pub mod storage;

use serde::{Deserialize, Serialize};

use self::activity::ActivityConfig;
use self::auth::AuthConfig;
use self::logging::LoggingConfig;
use self::notification::NotificationConfig;
use self::storage::StorageConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Blob storage settings.
    pub storage: StorageConfig,
    /// Record store settings.
    pub database: DatabaseConfig,
    /// Activity feed and statistics limits.
    pub activity: ActivityConfig,
    /// Notification settings.
    pub notifications: NotificationConfig,
    /// Password reset settings.
    pub auth: AuthConfig,
    /// Search settings.
    pub search: SearchConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Record store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path of the JSON snapshot of the in-memory store. When unset the
    /// store lives only for the lifetime of the process.
    #[serde(default)]
    pub snapshot_path: Option<String>,
}

/// Search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of documents returned by a search.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_limit: default_result_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `DOCVAULT__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let overlay = format!("config/{env}");
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&overlay).required(false))
            .add_source(
                config::Environment::with_prefix("DOCVAULT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                AppError::configuration(format!("Failed to build config: {e}"))
            })?;

        config
            .try_deserialize()
            .map_err(|e| {
                AppError::configuration(format!("Failed to deserialize config: {e}"))
            })
    }
}

fn default_result_limit() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.storage.root_path, "./data/blobs");
        assert_eq!(config.storage.max_upload_size_bytes, 100 * 1024 * 1024);
        assert_eq!(config.activity.user_feed_limit, 50);
        assert_eq!(config.activity.statistics_limit, 20);
        assert_eq!(config.activity.statistics_window_days, 7);
        assert_eq!(config.notifications.comment_preview_chars, 50);
        assert_eq!(config.auth.reset_token_ttl_minutes, 15);
        assert_eq!(config.search.result_limit, 100);
        assert!(config.database.snapshot_path.is_none());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"activity": {"user_feed_limit": 5}, "logging": {"format": "pretty"}}"#,
        )
        .unwrap();
        assert_eq!(config.activity.user_feed_limit, 5);
        assert_eq!(config.activity.recent_files_limit, 10);
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.level, "info");
    }
}
