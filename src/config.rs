//! Configuration file handling.
//!
//! Every key is optional; a missing file section falls back to defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::processor::ProcessorError;

/// Default config file name looked up by the CLI.
pub const DEFAULT_CONFIG_FILE: &str = "funding.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// CSV loading settings.
    #[serde(default)]
    pub load: LoadConfig,

    /// Dashboard page settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Query cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

/// CSV loading settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// `chrono` format strings tried in order for the `date` column.
    /// Each is also tried with a trailing ` %H:%M:%S`.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            date_formats: default_date_formats(),
        }
    }
}

fn default_date_formats() -> Vec<String> {
    // Month-first before day-first: "05/01/2018" is May 1st, "31/12/2019" falls through
    [
        "%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%Y/%m/%d", "%m-%d-%Y", "%d-%m-%Y", "%d.%m.%Y",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Dashboard page settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Entries in the overall top startups / top investors rankings.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Rows in each investor sub-query (recent, top, similar investors).
    #[serde(default = "default_investor_limit")]
    pub investor_limit: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            investor_limit: default_investor_limit(),
        }
    }
}

fn default_top_n() -> usize {
    10
}

fn default_investor_limit() -> usize {
    5
}

/// Query cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum cached query results. 0 disables the cache.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    128
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ProcessorError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load `path` if it exists, otherwise defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ProcessorError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ProcessorError> {
        Ok(toml::from_str(content)?)
    }

    /// Default configuration rendered as TOML, for `--init-config`.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}
