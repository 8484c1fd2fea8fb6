use chrono::{DateTime, Utc};
use tracing::debug;

use common::{Column, Error, Field, Result, Series};

use crate::infer::compute_interval;
use crate::interval::Interval;

const SECONDS_PER_DAY: i64 = 86_400;

/// Start of the bucket of `step` seconds containing `ts`, with bucket edges
/// laid out from `origin`.
const fn bucket_start(ts: i64, origin: i64, step: i64) -> i64 {
    ts - (ts - origin).rem_euclid(step)
}

/// Running OHLCV aggregate of one bucket. Missing inputs are skipped.
struct Bucket {
    start: i64,
    open: Option<f64>,
    high: Option<f64>,
    low: Option<f64>,
    close: Option<f64>,
    volume: Option<f64>,
}

impl Bucket {
    fn new(start: i64) -> Self {
        Self {
            start,
            open: None,
            high: None,
            low: None,
            close: None,
            volume: None,
        }
    }

    fn push(&mut self, row: [Option<f64>; 5]) {
        let [open, high, low, close, volume] = row;
        self.open = self.open.or(open);
        self.high = merge_with(self.high, high, f64::max);
        self.low = merge_with(self.low, low, f64::min);
        self.close = close.or(self.close);
        self.volume = merge_with(self.volume, volume, |a, b| a + b);
    }
}

fn merge_with(acc: Option<f64>, value: Option<f64>, f: impl Fn(f64, f64) -> f64) -> Option<f64> {
    match (acc, value) {
        (Some(a), Some(v)) => Some(f(a, v)),
        (a, v) => a.or(v),
    }
}

/// Downsample an OHLCV series to `interval`.
///
/// Buckets are `interval` minutes wide, anchored at midnight UTC of the first
/// row's day, closed on the left and labelled by their right edge: rows in `[s, s + interval)`
/// produce one row dated `s + interval`. `open` is the first value, `high` the
/// max, `low` the min, `close` the last and `volume` the sum.
///
/// Empty buckets are never emitted. The leading bucket is dropped unless the
/// first row sits on its start, and the trailing bucket is dropped unless the
/// last row fills its final base-interval slot; partially covered edges are
/// never aggregated. Only the five OHLCV columns are carried.
///
/// # Errors
/// - `UnknownInterval` for a label outside the catalog.
/// - `InvalidInterval` if `interval` is not positive or not coarser than the
///   source's native interval.
/// - `MissingField` if an OHLCV column is absent.
/// - `IncompatibleSeries` if the source is unsorted or its native interval
///   cannot be inferred.
pub fn resample_to_interval(series: &Series, interval: impl Into<Interval>) -> Result<Series> {
    let interval = interval.into();
    let minutes = interval.minutes()?;
    if minutes <= 0 {
        return Err(Error::InvalidInterval(format!(
            "resample interval must be positive, got {minutes} minutes"
        )));
    }

    let columns = Field::OHLCV
        .iter()
        .map(|f| series.require(f))
        .collect::<Result<Vec<&Column>>>()?;

    if series.is_empty() {
        return empty_ohlcv();
    }
    if !series.is_sorted() {
        return Err(Error::IncompatibleSeries(
            "series must be sorted by ascending date before resampling".into(),
        ));
    }

    let base = compute_interval(series)?;
    if minutes <= base {
        return Err(Error::InvalidInterval(format!(
            "resample interval of {minutes} minutes is not coarser than the source interval of {base} minutes"
        )));
    }

    let step = minutes * 60;
    let base_secs = base * 60;
    let dates = series.dates();
    let origin = bucket_start(dates[0].timestamp(), 0, SECONDS_PER_DAY);

    let mut buckets: Vec<Bucket> = Vec::new();
    for (i, date) in dates.iter().enumerate() {
        let start = bucket_start(date.timestamp(), origin, step);
        if buckets.last().map(|b| b.start) != Some(start) {
            buckets.push(Bucket::new(start));
        }
        let row = [
            columns[0][i],
            columns[1][i],
            columns[2][i],
            columns[3][i],
            columns[4][i],
        ];
        if let Some(bucket) = buckets.last_mut() {
            bucket.push(row);
        }
    }

    let total = buckets.len();
    let first_ts = dates[0].timestamp();
    let last_ts = dates[dates.len() - 1].timestamp();
    if buckets.last().is_some_and(|b| last_ts + base_secs < b.start + step) {
        buckets.pop();
    }
    if buckets.first().is_some_and(|b| first_ts != b.start) {
        buckets.remove(0);
    }

    debug!(
        interval = %interval,
        rows = series.len(),
        buckets = buckets.len(),
        dropped_edges = total - buckets.len(),
        "Resampled series"
    );

    let labels = buckets
        .iter()
        .map(|b| {
            DateTime::<Utc>::from_timestamp(b.start + step, 0).ok_or_else(|| {
                Error::IncompatibleSeries(format!("bucket label out of range at {}s", b.start + step))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Series::new(labels)
        .with_column(Field::Open, buckets.iter().map(|b| b.open).collect())?
        .with_column(Field::High, buckets.iter().map(|b| b.high).collect())?
        .with_column(Field::Low, buckets.iter().map(|b| b.low).collect())?
        .with_column(Field::Close, buckets.iter().map(|b| b.close).collect())?
        .with_column(Field::Volume, buckets.iter().map(|b| b.volume).collect())
}

fn empty_ohlcv() -> Result<Series> {
    Field::OHLCV
        .iter()
        .try_fold(Series::new(Vec::new()), |s, f| s.with_column(f.clone(), Vec::new()))
}
