//! Configuration management for querygate.
//!
//! Configuration is loaded from environment variables following the 12-factor app pattern.

use crate::constants::{DEFAULT_HISTORY_CAPACITY, DEFAULT_MAX_RESULT_ROWS};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How command output is rendered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON document per invocation.
    Json,
}

/// Configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum rows returned by the guarded executor
    pub max_result_rows: usize,

    /// Number of gate decisions kept in memory
    pub history_capacity: usize,

    /// Output rendering
    pub output: OutputFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// All optional:
    /// - `QUERYGATE_MAX_ROWS`: Maximum result rows (default: 10000; 0 falls back to the default)
    /// - `QUERYGATE_HISTORY_SIZE`: History capacity (default: 100, 0 disables)
    /// - `QUERYGATE_OUTPUT`: Output format, `text` or `json` (default: text)
    pub fn from_env() -> Self {
        let max_result_rows = match std::env::var("QUERYGATE_MAX_ROWS")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            Some(0) => {
                warn!("QUERYGATE_MAX_ROWS must be greater than zero, using default");
                DEFAULT_MAX_RESULT_ROWS
            }
            Some(rows) => rows,
            None => DEFAULT_MAX_RESULT_ROWS,
        };

        let history_capacity = std::env::var("QUERYGATE_HISTORY_SIZE")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_HISTORY_CAPACITY);

        let output = match std::env::var("QUERYGATE_OUTPUT") {
            Ok(value) => match value.to_lowercase().as_str() {
                "text" => OutputFormat::Text,
                "json" => OutputFormat::Json,
                other => {
                    warn!(value = other, "Unknown QUERYGATE_OUTPUT, using text");
                    OutputFormat::Text
                }
            },
            Err(_) => OutputFormat::default(),
        };

        Config {
            max_result_rows,
            history_capacity,
            output,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_result_rows: DEFAULT_MAX_RESULT_ROWS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            output: OutputFormat::Text,
        }
    }
}
