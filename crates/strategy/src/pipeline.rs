//! Informative timeframes: compute an indicator on a coarser resample of a
//! series and merge the result back onto the series' own rows.

use tracing::debug;

use common::{Field, Result, Series};
use timeframe::{resample_to_interval, resampled_merge, Interval, ResampleCache};

use crate::Indicator;

/// How indicator columns are merged back onto the base series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Forward-fill merged values until the next bucket arrives.
    pub fill_gaps: bool,
    /// Rename merged columns to `Field::Resampled { minutes, .. }`.
    pub tag_interval: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            fill_gaps: true,
            tag_interval: false,
        }
    }
}

/// Resample `original` to `interval`, run `indicator` on the coarse series and
/// merge its columns back onto `original`.
pub fn informative(
    original: &Series,
    interval: impl Into<Interval>,
    indicator: &dyn Indicator,
    options: MergeOptions,
) -> Result<Series> {
    let interval = interval.into();
    let minutes = interval.minutes()?;
    let resampled = resample_to_interval(original, interval)?;
    merge_indicator(original, resampled, minutes, indicator, options)
}

/// [`informative`], with the resample taken from a caller-owned cache keyed
/// by `instrument`.
pub fn informative_cached(
    cache: &mut ResampleCache,
    instrument: &str,
    original: &Series,
    interval: impl Into<Interval>,
    indicator: &dyn Indicator,
    options: MergeOptions,
) -> Result<Series> {
    let interval = interval.into();
    let minutes = interval.minutes()?;
    let resampled = cache.get_or_resample(instrument, original, interval)?.clone();
    merge_indicator(original, resampled, minutes, indicator, options)
}

fn merge_indicator(
    original: &Series,
    mut resampled: Series,
    minutes: i64,
    indicator: &dyn Indicator,
    options: MergeOptions,
) -> Result<Series> {
    let columns = indicator.compute(&resampled)?;
    debug!(
        indicator = indicator.name(),
        interval_minutes = minutes,
        buckets = resampled.len(),
        columns = columns.len(),
        "Computed informative indicator"
    );
    for (field, column) in columns {
        let field = if options.tag_interval {
            Field::resampled(minutes, field)
        } else {
            field
        };
        resampled.insert(field, column)?;
    }
    resampled_merge(original, &resampled, options.fill_gaps)
}
