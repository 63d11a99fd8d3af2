//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::query::{OrderByTime, QueryDefaults};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to queries that lack them
#[derive(Debug, Clone, Deserialize)]
pub struct QueryConfig {
    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_field")]
    pub field: String,

    #[serde(default = "default_aggregation")]
    pub aggregation: String,

    #[serde(default = "default_interval")]
    pub interval: String,

    #[serde(default = "default_fill")]
    pub fill: String,

    #[serde(default)]
    pub order_by_time: OrderByTime,
}

fn default_table() -> String {
    crate::query::DEFAULT_TABLE.to_string()
}

fn default_field() -> String {
    "value".to_string()
}

fn default_aggregation() -> String {
    "avg".to_string()
}

fn default_interval() -> String {
    "$__interval".to_string()
}

fn default_fill() -> String {
    "null".to_string()
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            field: default_field(),
            aggregation: default_aggregation(),
            interval: default_interval(),
            fill: default_fill(),
            order_by_time: OrderByTime::Asc,
        }
    }
}

impl From<&QueryConfig> for QueryDefaults {
    fn from(config: &QueryConfig) -> Self {
        let mut defaults = QueryDefaults::new(
            &config.table,
            &config.field,
            &config.aggregation,
            &config.interval,
            &config.fill,
        );
        defaults.order_by_time = config.order_by_time;
        defaults
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("cnosql").join("config.toml")),
            Some(PathBuf::from("./cnosql.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Defaults for new queries
    pub fn query_defaults(&self) -> QueryDefaults {
        QueryDefaults::from(&self.query)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Query overrides
        if let Ok(table) = std::env::var("CNOSQL_DEFAULT_TABLE") {
            self.query.table = table;
        }
        if let Ok(interval) = std::env::var("CNOSQL_DEFAULT_INTERVAL") {
            self.query.interval = interval;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("CNOSQL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CNOSQL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# CnoSQL Query Builder Configuration
#
# Environment variables override these settings:
# - CNOSQL_DEFAULT_TABLE
# - CNOSQL_DEFAULT_INTERVAL
# - CNOSQL_LOG_LEVEL
# - CNOSQL_LOG_FORMAT

[query]
# Table used when a query names none
table = "default_table"

# Field and aggregation of the initial select list
field = "value"
aggregation = "avg"

# Initial time(...) and fill(...) group-by parameters
interval = "$__interval"
fill = "null"

# Sort direction on the time column: "ASC" or "DESC"
order_by_time = "ASC"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
