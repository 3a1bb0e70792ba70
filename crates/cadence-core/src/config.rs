use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder};
use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub materialization: MaterializationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Horizon policy for occurrence materialization.
///
/// A single materialization pass stops at whichever limit is reached first:
/// `initial_instance_count` occurrences, or `window_months` calendar months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct MaterializationConfig {
    pub initial_instance_count: u16,
    pub window_months: u32,
    pub extension_threshold_days: u32,
    pub history_retention_months: u32,
}

impl Default for MaterializationConfig {
    fn default() -> Self {
        Self {
            initial_instance_count: 100,
            window_months: 12,
            extension_threshold_days: 30,
            history_retention_months: 3,
        }
    }
}

impl MaterializationConfig {
    /// ## Summary
    /// Checks that the horizon policy can make progress.
    ///
    /// ## Errors
    /// Returns `CoreError::InvalidConfiguration` if the instance count or window is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.initial_instance_count == 0 {
            return Err(CoreError::InvalidConfiguration(
                "materialization.initial_instance_count must be at least 1".to_string(),
            ));
        }
        if self.window_months == 0 {
            return Err(CoreError::InvalidConfiguration(
                "materialization.window_months must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Settings {
    /// ## Summary
    /// Returns a config builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be registered.
    pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>> {
        let defaults = MaterializationConfig::default();
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "info")?
            .set_default(
                "materialization.initial_instance_count",
                i64::from(defaults.initial_instance_count),
            )?
            .set_default(
                "materialization.window_months",
                i64::from(defaults.window_months),
            )?
            .set_default(
                "materialization.extension_threshold_days",
                i64::from(defaults.extension_threshold_days),
            )?
            .set_default(
                "materialization.history_retention_months",
                i64::from(defaults.history_retention_months),
            )?)
    }

    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration, deserializing it, or
    /// validating the materialization policy fails.
    pub fn load() -> Result<Self> {
        let settings = Self::builder_with_defaults()?
            // Env file
            .add_source(
                config::Environment::default()
                    .convert_case(config::Case::Snake)
                    .separator("_")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?;

        settings.materialization.validate()?;
        tracing::debug!(
            bind_addr = %settings.server.bind_addr(),
            materialization = ?settings.materialization,
            "Configuration loaded"
        );
        Ok(settings)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
