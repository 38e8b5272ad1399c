//! # Ledger Configuration
//!
//! Settings loaded once at startup; read-only afterwards.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOCKROOM_DB_PATH=./data/stockroom.db                              │
//! │     STOCKROOM_LOW_STOCK_THRESHOLD=10                                   │
//! │     STOCKROOM_TAX_RATE=5        (percent, "8.25" allowed)              │
//! │     STOCKROOM_STORE_NAME="Corner Grocers"                              │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     stockroom.toml                                                     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! store_name = "Corner Grocers"
//! database_path = "./data/stockroom.db"
//! max_connections = 5
//! low_stock_threshold = 10
//! tax_rate_bps = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stockroom_core::validation::validate_tax_rate_bps;
use stockroom_core::{TaxRate, DEFAULT_TAX_RATE_BPS, LOW_STOCK_THRESHOLD};
use stockroom_db::DbConfig;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "stockroom.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Ledger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Shown on invoices and in logs.
    pub store_name: String,

    /// SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// Products at or below this stock are "low stock".
    pub low_stock_threshold: i64,

    /// Invoice tax rate in basis points (500 = 5%).
    pub tax_rate_bps: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            store_name: "Stockroom".to_string(),
            database_path: PathBuf::from("stockroom.db"),
            max_connections: 5,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
        }
    }
}

impl LedgerConfig {
    /// Loads defaults, then `path` (or `stockroom.toml` if it exists),
    /// then `STOCKROOM_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                debug!("No config file, using defaults");
                Self::default()
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading ledger config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `STOCKROOM_*` overrides read through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("STOCKROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = PathBuf::from(path);
        }

        if let Some(name) = lookup("STOCKROOM_STORE_NAME") {
            self.store_name = name;
        }

        if let Some(raw) = lookup("STOCKROOM_LOW_STOCK_THRESHOLD") {
            self.low_stock_threshold =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "STOCKROOM_LOW_STOCK_THRESHOLD".to_string(),
                        value: raw.clone(),
                    })?;
        }

        if let Some(raw) = lookup("STOCKROOM_TAX_RATE") {
            self.tax_rate_bps = parse_percent_bps(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "STOCKROOM_TAX_RATE".to_string(),
                value: raw.clone(),
            })?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue {
                key: "low_stock_threshold".to_string(),
                value: self.low_stock_threshold.to_string(),
            });
        }

        validate_tax_rate_bps(self.tax_rate_bps).map_err(|_| ConfigError::InvalidValue {
            key: "tax_rate_bps".to_string(),
            value: self.tax_rate_bps.to_string(),
        })?;

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_connections".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    /// Pool settings for the SQLite store.
    pub fn db_config(&self) -> DbConfig {
        if self.database_path.as_os_str() == ":memory:" {
            DbConfig::in_memory()
        } else {
            DbConfig::new(&self.database_path).max_connections(self.max_connections)
        }
    }
}

/// Parses a percentage ("5", "8.25") into basis points without floats.
fn parse_percent_bps(raw: &str) -> Option<u32> {
    let raw = raw.trim().trim_end_matches('%');
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: u32 = whole.parse().ok()?;
    let frac: u32 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u32>().ok()? * 10,
        _ => frac.parse().ok()?,
    };

    whole.checked_mul(100)?.checked_add(frac)
}
