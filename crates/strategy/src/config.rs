use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use common::{Error, Result};
use timeframe::Interval;

/// Top-level indicator config file (TOML).
///
/// Example `config/indicators.toml`:
/// ```toml
/// [[informative]]
/// kind = "ichimoku"
/// interval = "4h"
/// tag_interval = true
///
/// [informative.params]
/// span_a = "tenkan_kijun"
/// tenkan_window = 9
/// kijun_window = 26
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicatorFileConfig {
    #[serde(rename = "informative", default)]
    pub sets: Vec<InformativeConfig>,
}

/// One indicator computed on one informative timeframe.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InformativeConfig {
    /// Indicator type identifier: "ichimoku" or "rsi".
    pub kind: String,
    /// Timeframe to compute on: a catalog label ("4h") or minutes (240).
    pub interval: IntervalSetting,
    /// Set name keyed into every output column ("sell" gives `sell_tenkan_sen`),
    /// so several parameter sets can share one timeframe.
    #[serde(default)]
    pub name: Option<String>,
    /// Forward-fill merged values between buckets.
    #[serde(default = "default_fill_gaps")]
    pub fill_gaps: bool,
    /// Rename merged columns with the interval so timeframes can coexist.
    #[serde(default)]
    pub tag_interval: bool,
    /// Indicator-specific parameters.
    #[serde(default)]
    pub params: HashMap<String, toml::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum IntervalSetting {
    Minutes(i64),
    Label(String),
}

impl From<&IntervalSetting> for Interval {
    fn from(setting: &IntervalSetting) -> Self {
        match setting {
            IntervalSetting::Minutes(m) => Interval::Minutes(*m),
            IntervalSetting::Label(label) => Interval::Label(label.clone()),
        }
    }
}

fn default_fill_gaps() -> bool {
    true
}

impl IndicatorFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse indicator config at '{path}': {e}")))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sets_with_defaults() {
        let cfg = IndicatorFileConfig::from_toml_str(
            r#"
            [[informative]]
            kind = "ichimoku"
            interval = "4h"

            [informative.params]
            span_a = "tenkan_only"
            tenkan_window = 7

            [[informative]]
            kind = "rsi"
            interval = 60
            name = "sell"
            fill_gaps = false
            tag_interval = true
            "#,
        )
        .unwrap();

        assert_eq!(cfg.sets.len(), 2);
        let ichimoku = &cfg.sets[0];
        assert_eq!(ichimoku.interval, IntervalSetting::Label("4h".into()));
        assert!(ichimoku.fill_gaps);
        assert!(!ichimoku.tag_interval);
        assert_eq!(ichimoku.name, None);
        assert_eq!(ichimoku.params["tenkan_window"].as_integer(), Some(7));

        let rsi = &cfg.sets[1];
        assert_eq!(Interval::from(&rsi.interval), Interval::Minutes(60));
        assert!(!rsi.fill_gaps);
        assert_eq!(rsi.name.as_deref(), Some("sell"));
        assert!(rsi.params.is_empty());
    }

    #[test]
    fn empty_file_has_no_sets() {
        let cfg = IndicatorFileConfig::from_toml_str("").unwrap();
        assert!(cfg.sets.is_empty());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let err = IndicatorFileConfig::from_toml_str("[[informative]]\nkind = 3").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = IndicatorFileConfig::load("/nonexistent/indicators.toml").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
