use std::collections::HashMap;

use tracing::{debug, info};

use common::{Error, Result, Series};
use timeframe::{Interval, ResampleCache};

use crate::config::{IndicatorFileConfig, InformativeConfig};
use crate::indicators::{Ichimoku, IchimokuParams, Rsi, SpanAFormula};
use crate::pipeline::{informative_cached, MergeOptions};
use crate::{Indicator, NamedSet};

/// One configured indicator on one informative timeframe.
struct InformativeSet {
    interval: Interval,
    indicator: Box<dyn Indicator>,
    options: MergeOptions,
}

/// Holds the configured informative sets and applies them to a series.
pub struct IndicatorRegistry {
    sets: Vec<InformativeSet>,
}

impl IndicatorRegistry {
    /// Build the registry from config. Unknown indicator types and bad
    /// parameters are errors.
    pub fn from_config(file_cfg: &IndicatorFileConfig) -> Result<Self> {
        let mut sets = Vec::with_capacity(file_cfg.sets.len());

        for cfg in &file_cfg.sets {
            let interval = Interval::from(&cfg.interval);
            // Resolve labels now so a typo fails at startup.
            let minutes = interval.minutes()?;
            let indicator = build_set(cfg)?;
            info!(
                indicator = %indicator.name(),
                set = cfg.name.as_deref().unwrap_or("default"),
                interval_minutes = minutes,
                "Registered informative indicator"
            );
            sets.push(InformativeSet {
                interval,
                indicator,
                options: MergeOptions {
                    fill_gaps: cfg.fill_gaps,
                    tag_interval: cfg.tag_interval,
                },
            });
        }

        Ok(Self { sets })
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Apply every set in order, merging each onto the output of the last.
    /// Resamples go through `cache` under `instrument`.
    pub fn process(
        &self,
        instrument: &str,
        series: &Series,
        cache: &mut ResampleCache,
    ) -> Result<Series> {
        let mut merged = series.clone();
        for set in &self.sets {
            merged = informative_cached(
                cache,
                instrument,
                &merged,
                set.interval.clone(),
                set.indicator.as_ref(),
                set.options,
            )?;
        }
        debug!(instrument, sets = self.sets.len(), columns = merged.fields().count(), "Processed series");
        Ok(merged)
    }
}

// ─── Indicator builders ───────────────────────────────────────────────────────

fn build_indicator(cfg: &InformativeConfig) -> Result<Box<dyn Indicator>> {
    match cfg.kind.as_str() {
        "ichimoku" => {
            let defaults = IchimokuParams::standard(SpanAFormula::TenkanKijun);
            let params = IchimokuParams {
                tenkan_window: param_usize(&cfg.params, "tenkan_window", defaults.tenkan_window)?,
                kijun_window: param_usize(&cfg.params, "kijun_window", defaults.kijun_window)?,
                senkou_offset: param_usize(&cfg.params, "senkou_offset", defaults.senkou_offset)?,
                senkou_b_window: param_usize(
                    &cfg.params,
                    "senkou_b_window",
                    defaults.senkou_b_window,
                )?,
                chikou_offset: param_usize(&cfg.params, "chikou_offset", defaults.chikou_offset)?,
                span_a: span_a_formula(&cfg.params)?,
            };
            Ok(Box::new(Ichimoku::new(params)?))
        }
        "rsi" => {
            let period = param_usize(&cfg.params, "period", 14)?;
            Ok(Box::new(Rsi::new(period)?))
        }
        other => Err(Error::Config(format!("unknown indicator type '{other}'"))),
    }
}

fn build_set(cfg: &InformativeConfig) -> Result<Box<dyn Indicator>> {
    let indicator = build_indicator(cfg)?;
    match cfg.name.as_deref() {
        None => Ok(indicator),
        Some("") => Err(Error::Config("informative set name must not be empty".into())),
        Some(set) => Ok(Box::new(NamedSet::new(set, indicator))),
    }
}

/// The Span A formula has no default; the config must name it.
fn span_a_formula(params: &HashMap<String, toml::Value>) -> Result<SpanAFormula> {
    let value = params.get("span_a").ok_or_else(|| {
        Error::Config("ichimoku requires params.span_a ('tenkan_kijun' or 'tenkan_only')".into())
    })?;
    value.clone().try_into().map_err(|e| {
        Error::Config(format!(
            "span_a must be 'tenkan_kijun' or 'tenkan_only', got {value}: {e}"
        ))
    })
}

fn param_usize(params: &HashMap<String, toml::Value>, key: &str, default: usize) -> Result<usize> {
    match params.get(key) {
        None => Ok(default),
        Some(value) => value
            .as_integer()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| Error::Config(format!("param '{key}' must be a non-negative integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use common::{Candle, Column, Field, Line};

    fn registry(toml: &str) -> Result<IndicatorRegistry> {
        IndicatorRegistry::from_config(&IndicatorFileConfig::from_toml_str(toml)?)
    }

    fn five_minute(count: i64) -> Series {
        let candles: Vec<Candle> = (0..count)
            .map(|i| Candle {
                date: Utc.timestamp_opt(i * 300, 0).unwrap(),
                open: 10.0,
                high: 10.0 + (i % 7) as f64,
                low: 5.0,
                close: 8.0,
                volume: 2.0,
            })
            .collect();
        Series::from_candles(&candles)
    }

    #[test]
    fn builds_and_processes_configured_sets() {
        let registry = registry(
            r#"
            [[informative]]
            kind = "ichimoku"
            interval = "1h"
            [informative.params]
            span_a = "tenkan_kijun"

            [[informative]]
            kind = "rsi"
            interval = "4h"
            tag_interval = true
            [informative.params]
            period = 3
            "#,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);

        let mut cache = ResampleCache::new();
        let series = five_minute(1200);
        let merged = registry.process("BTCUSDT", &series, &mut cache).unwrap();
        assert_eq!(merged.len(), series.len());
        assert!(merged.contains(&Field::Line(Line::KijunSen)));
        assert!(merged.contains(&Field::resampled(240, Field::Line(Line::Rsi { period: 3 }))));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn span_a_must_be_named() {
        let err = registry(
            r#"
            [[informative]]
            kind = "ichimoku"
            interval = "1h"
            "#,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn unknown_kind_and_interval_are_rejected() {
        let err = registry("[[informative]]\nkind = \"macd\"\ninterval = \"1h\"").err().unwrap();
        assert!(matches!(err, Error::Config(_)));
        let err = registry("[[informative]]\nkind = \"rsi\"\ninterval = \"3h\"").err().unwrap();
        assert!(matches!(err, Error::UnknownInterval(_)));
    }

    #[test]
    fn negative_window_is_rejected() {
        let err = registry(
            r#"
            [[informative]]
            kind = "ichimoku"
            interval = "1h"
            [informative.params]
            span_a = "tenkan_only"
            kijun_window = -3
            "#,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn buy_and_sell_ichimoku_share_one_interval() {
        let registry = registry(
            r#"
            [[informative]]
            kind = "ichimoku"
            interval = "4h"
            tag_interval = true
            [informative.params]
            span_a = "tenkan_only"
            tenkan_window = 15
            kijun_window = 29

            [[informative]]
            kind = "ichimoku"
            interval = "4h"
            name = "sell"
            tag_interval = true
            [informative.params]
            span_a = "tenkan_only"
            tenkan_window = 13
            kijun_window = 20
            "#,
        )
        .unwrap();

        let mut cache = ResampleCache::new();
        let merged = registry.process("BTCUSDT", &five_minute(4800), &mut cache).unwrap();
        let buy = Field::resampled(240, Field::Line(Line::TenkanSen));
        let sell = Field::resampled(240, Field::named("sell", Line::TenkanSen));
        assert_eq!(sell.to_string(), "resample_240_sell_tenkan_sen");

        let (buy, sell) = (merged.column(&buy).unwrap(), merged.column(&sell).unwrap());
        // The 13-bucket window fills before the 15-bucket one.
        let first_defined = |c: &Column| c.iter().position(Option::is_some);
        assert!(first_defined(sell) < first_defined(buy));
        // One shared 4h resample serves both sets.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn empty_set_name_is_rejected() {
        let err = registry("[[informative]]\nkind = \"rsi\"\ninterval = \"1h\"\nname = \"\"")
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn span_a_must_be_a_known_formula() {
        let err = registry(
            r#"
            [[informative]]
            kind = "ichimoku"
            interval = "1h"
            [informative.params]
            span_a = "kijun_only"
            "#,
        )
        .err()
        .unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn huge_offset_leaves_chikou_empty() {
        let registry = registry(
            r#"
            [[informative]]
            kind = "ichimoku"
            interval = "1h"
            [informative.params]
            span_a = "tenkan_kijun"
            chikou_offset = 9223372036854775807
            "#,
        )
        .unwrap();
        let mut cache = ResampleCache::new();
        let merged = registry.process("BTCUSDT", &five_minute(1200), &mut cache).unwrap();
        let chikou = merged.column(&Field::Line(Line::ChikouSpan)).unwrap();
        assert!(chikou.iter().all(Option::is_none));
    }

    #[test]
    fn same_untagged_columns_twice_collide() {
        let registry = registry(
            r#"
            [[informative]]
            kind = "rsi"
            interval = "1h"

            [[informative]]
            kind = "rsi"
            interval = "4h"
            "#,
        )
        .unwrap();
        let mut cache = ResampleCache::new();
        let err = registry.process("BTCUSDT", &five_minute(1200), &mut cache).unwrap_err();
        assert!(matches!(err, Error::IncompatibleSeries(_)));
    }
}
