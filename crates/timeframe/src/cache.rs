use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use common::{Field, Result, Series};

use crate::interval::Interval;
use crate::resample::resample_to_interval;

/// Identifies the source a cached resample was built from. Values are held
/// as bit patterns so the fingerprint stays `Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Fingerprint {
    rows: usize,
    last: Option<DateTime<Utc>>,
    last_close: Option<u64>,
    last_volume: Option<u64>,
}

impl Fingerprint {
    fn of(series: &Series) -> Self {
        let last_value = |field: &Field| {
            series
                .column(field)
                .and_then(|c| c.last().copied().flatten())
                .map(f64::to_bits)
        };
        Self {
            rows: series.len(),
            last: series.dates().last().copied(),
            last_close: last_value(&Field::Close),
            last_volume: last_value(&Field::Volume),
        }
    }
}

struct Entry {
    source: Fingerprint,
    resampled: Series,
}

/// Resampled series per instrument and interval.
///
/// Owned by the caller and passed to the pipeline explicitly. An entry is
/// reused only while the source keeps the same row count, last date, last
/// close and last volume; any new candle or an update to the forming candle
/// rebuilds it. Rewrites of earlier rows are not detected: call
/// [`ResampleCache::invalidate`] after editing history.
#[derive(Default)]
pub struct ResampleCache {
    entries: HashMap<(String, i64), Entry>,
}

impl ResampleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached resample of `series` for `instrument`, building it
    /// with [`resample_to_interval`] on a miss or a stale entry.
    pub fn get_or_resample(
        &mut self,
        instrument: &str,
        series: &Series,
        interval: impl Into<Interval>,
    ) -> Result<&Series> {
        let interval = interval.into();
        let key = (instrument.to_string(), interval.minutes()?);
        let source = Fingerprint::of(series);

        let fresh = self.entries.get(&key).is_some_and(|e| e.source == source);
        if fresh {
            trace!(instrument, interval = %interval, "Resample cache hit");
        } else {
            debug!(instrument, interval = %interval, rows = source.rows, "Resample cache miss");
            let resampled = resample_to_interval(series, interval)?;
            self.entries.insert(key.clone(), Entry { source, resampled });
        }
        Ok(&self.entries[&key].resampled)
    }

    /// Drop every entry for `instrument`.
    pub fn invalidate(&mut self, instrument: &str) {
        self.entries.retain(|(name, _), _| name != instrument);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
