//! Application settings loading from config.toml
//!
//! The settings object is built once at process start and handed to whatever
//! needs it. Core functions never read the environment themselves.
//!
//! Lookup order:
//! 1. `HOME_LEDGER_CONFIG` (path to a TOML file), falling back to `./config.toml`
//! 2. built-in defaults when the file does not exist
//! 3. `DATABASE_URL` overrides `[database].url`

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_PATH_VAR: &str = "HOME_LEDGER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Storage settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Log filter settings
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Chart and trend settings
    #[serde(default)]
    pub overview: OverviewConfig,
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `SeaORM` connection string
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://home_ledger.sqlite?mode=rwc".to_string(),
        }
    }
}

/// `[logging]` section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// `[overview]` section
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OverviewConfig {
    /// Minimum number of historical months before a trend percentage is reported
    pub min_trend_samples: usize,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self {
            min_trend_samples: 2,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns `Error::Config` when the TOML is malformed or a value has the wrong type.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Where the settings of a [`LoadedConfig`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// Read from this TOML file
    File(PathBuf),
    /// No file at this path, built-in defaults were used
    Defaults(PathBuf),
}

/// Settings plus the facts about how they were resolved.
///
/// Loading happens before the log subscriber exists, so nothing is logged
/// while loading; call [`LoadedConfig::log_origin`] once tracing is installed.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The resolved settings
    pub config: AppConfig,
    /// Config file or defaults
    pub origin: ConfigOrigin,
    /// Whether `DATABASE_URL` replaced `[database].url`
    pub database_url_overridden: bool,
}

impl LoadedConfig {
    /// Reports the config source and any environment override.
    pub fn log_origin(&self) {
        match &self.origin {
            ConfigOrigin::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigOrigin::Defaults(path) => {
                warn!("No configuration file at {}, using defaults", path.display());
            }
        }
        if self.database_url_overridden {
            debug!("DATABASE_URL overrides configured database url");
        }
    }
}

/// Resolves settings from `path` (if it exists) and an optional database url.
///
/// # Errors
/// Returns an error when the file exists but cannot be read or parsed.
pub fn resolve_configuration(
    path: impl Into<PathBuf>,
    database_url: Option<String>,
) -> Result<LoadedConfig> {
    let path = path.into();
    let (mut config, origin) = if path.exists() {
        (load_config(&path)?, ConfigOrigin::File(path))
    } else {
        (AppConfig::default(), ConfigOrigin::Defaults(path))
    };

    let database_url_overridden = database_url.is_some();
    if let Some(url) = database_url {
        config.database.url = url;
    }

    Ok(LoadedConfig {
        config,
        origin,
        database_url_overridden,
    })
}

/// Builds the application settings from the config file and the environment.
///
/// A missing config file is not an error; defaults are used instead.
///
/// # Errors
/// Returns an error when the config file exists but cannot be read or parsed.
pub fn load_app_configuration() -> Result<LoadedConfig> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    resolve_configuration(path, std::env::var("DATABASE_URL").ok())
}
