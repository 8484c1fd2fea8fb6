use crate::{Error, Result};

/// Runner configuration loaded from environment variables at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// JSON array of candles to process.
    pub candles_path: String,
    /// TOML file listing the informative indicator sets.
    pub indicator_config_path: String,
    /// Instrument name used as the resample cache key.
    pub instrument: String,
    /// Where to write the merged rows; stdout when unset.
    pub output_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` if present. A missing required variable is an error.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        Ok(Config {
            candles_path: required_env("MTF_CANDLES_PATH")?,
            indicator_config_path: optional_env("MTF_INDICATOR_CONFIG_PATH")
                .unwrap_or_else(|| "config/indicators.toml".to_string()),
            instrument: optional_env("MTF_INSTRUMENT").unwrap_or_else(|| "default".to_string()),
            output_path: optional_env("MTF_OUTPUT_PATH"),
        })
    }
}

fn required_env(key: &str) -> Result<String> {
    optional_env(key).ok_or_else(|| {
        Error::Config(format!(
            "Required environment variable '{key}' is not set. Check your .env file."
        ))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
