use std::fs;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Candle, Config, Series};
use strategy::{IndicatorFileConfig, IndicatorRegistry};
use timeframe::{compute_interval_label, ResampleCache};

fn main() -> anyhow::Result<()> {
    // ── Logging ──────────────────────────────────────────────────────────────
    // Stdout carries the JSON output, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env()?;
    info!(instrument = %cfg.instrument, "mtf starting");

    // ── Candles ───────────────────────────────────────────────────────────────
    let raw = fs::read_to_string(&cfg.candles_path)
        .with_context(|| format!("Failed to read candles at '{}'", cfg.candles_path))?;
    let candles: Vec<Candle> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse candles at '{}'", cfg.candles_path))?;
    let series = Series::from_candles(&candles);
    match compute_interval_label(&series) {
        Ok(label) => info!(rows = series.len(), interval = label, "Candles loaded"),
        Err(e) => warn!(rows = series.len(), error = %e, "Candles loaded without a catalog interval"),
    }

    // ── Indicators ────────────────────────────────────────────────────────────
    let file_cfg = IndicatorFileConfig::load(&cfg.indicator_config_path)?;
    let registry = IndicatorRegistry::from_config(&file_cfg)?;
    if registry.is_empty() {
        warn!(path = %cfg.indicator_config_path, "No informative indicators configured");
    }
    let mut cache = ResampleCache::new();
    let merged = registry
        .process(&cfg.instrument, &series, &mut cache)
        .with_context(|| format!("Failed to process '{}'", cfg.instrument))?;

    // ── Output ────────────────────────────────────────────────────────────────
    let json = serde_json::to_string_pretty(&merged.to_records())?;
    match &cfg.output_path {
        Some(path) => fs::write(path, json).with_context(|| format!("Failed to write '{path}'"))?,
        None => println!("{json}"),
    }
    info!(rows = merged.len(), columns = merged.fields().count(), "mtf finished");
    Ok(())
}
