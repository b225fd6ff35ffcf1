//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod database;
pub mod indexing;
pub mod logging;
pub mod notification;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::indexing::IndexingConfig;
pub use self::logging::LoggingConfig;
pub use self::notification::NotificationConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Hierarchical index and tree mutation settings.
    #[serde(default)]
    pub indexing: IndexingConfig,
    /// Change-notification job settings.
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the given configuration file with an environment-specific
    /// overlay (`config/{env}.toml`) and environment variables prefixed
    /// with `DATAROOM_`.
    pub fn load(config_path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("DATAROOM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the indexer cannot operate with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.indexing.batch_size == 0 {
            return Err(AppError::configuration(
                "indexing.batch_size must be at least 1",
            ));
        }
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must be set"));
        }
        Ok(())
    }
}
