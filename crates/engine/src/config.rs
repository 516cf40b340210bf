//! Engine configuration loaded from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `LOTCOST_DATABASE_URL` (falls back to `DATABASE_URL`) | `sqlite://lotcost.db?mode=rwc` |
//! | `LOTCOST_MAX_CONNECTIONS` | `5` |
//! | `LOTCOST_COST_RATIO` | `0.7` |
//! | `LOTCOST_LOG_FORMAT` | `text` (`json` for structured output) |

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::pricing::{DEFAULT_COST_RATIO, PricingPolicy};

/// Database used when neither URL variable is set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://lotcost.db?mode=rwc";

/// Pool size used when `LOTCOST_MAX_CONNECTIONS` is not set.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format {other:?} (expected text or json)")),
        }
    }
}

/// Lot costing engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// `SQLite` connection URL.
    pub database_url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// Pricing policy applied to production batches.
    pub pricing: PricingPolicy,
    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            pricing: PricingPolicy::default(),
            log_format: LogFormat::Text,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unusable value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("LOTCOST_DATABASE_URL")
            .or_else(|| lookup("DATABASE_URL"))
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let max_connections = match lookup("LOTCOST_MAX_CONNECTIONS") {
            Some(raw) => parse_max_connections(&raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let cost_ratio = match lookup("LOTCOST_COST_RATIO") {
            Some(raw) => Decimal::from_str(raw.trim()).map_err(|e| {
                ConfigError::InvalidEnvVar("LOTCOST_COST_RATIO".to_string(), e.to_string())
            })?,
            None => DEFAULT_COST_RATIO,
        };
        let pricing = PricingPolicy::new(cost_ratio).map_err(|e| {
            ConfigError::InvalidEnvVar("LOTCOST_COST_RATIO".to_string(), e.to_string())
        })?;

        let log_format = lookup("LOTCOST_LOG_FORMAT")
            .map(|raw| raw.parse::<LogFormat>())
            .transpose()
            .map_err(|e| ConfigError::InvalidEnvVar("LOTCOST_LOG_FORMAT".to_string(), e))?
            .unwrap_or_default();

        Ok(Self {
            database_url,
            max_connections,
            pricing,
            log_format,
        })
    }
}

fn parse_max_connections(raw: &str) -> Result<u32, ConfigError> {
    let invalid = |reason: String| {
        ConfigError::InvalidEnvVar("LOTCOST_MAX_CONNECTIONS".to_string(), reason)
    };
    let value = raw.trim().parse::<u32>().map_err(|e| invalid(e.to_string()))?;
    if value == 0 {
        return Err(invalid("must be at least 1".to_string()));
    }
    Ok(value)
}
