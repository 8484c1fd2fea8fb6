use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

use common::{Column, Error, Field, Result, Series};

use crate::infer::compute_interval;

/// Merge the derived columns of a resampled series back onto the series it
/// was resampled from.
///
/// A resampled row labelled `t_b` summarises source rows up to
/// `t_b - base_interval`, so its label is shifted back by one base interval
/// and joined onto the fine row with exactly that date. The raw coarse
/// `open`/`high`/`low`/`close`/`volume` columns are dropped; only derived
/// columns are carried. With `fill_gaps` each carried column is forward-filled
/// down `original`'s row order until the next bucket's value arrives;
/// otherwise unmatched rows stay `None`.
///
/// The result has the same rows, in the same order, as `original`.
///
/// # Errors
/// - `IncompatibleSeries` if `original` has fewer than two rows, `resampled`
///   is not sorted, or a carried column already exists in `original`.
/// - Any error from inferring `original`'s interval.
pub fn resampled_merge(original: &Series, resampled: &Series, fill_gaps: bool) -> Result<Series> {
    merge_columns(original, resampled, fill_gaps, Field::clone)
}

/// [`resampled_merge`], with every carried column renamed to
/// `Field::Resampled { minutes, .. }` using the resampled series' own
/// interval. Lets several timeframes be merged onto the same series.
///
/// # Errors
/// As [`resampled_merge`], plus failure to infer `resampled`'s interval.
pub fn resampled_merge_tagged(
    original: &Series,
    resampled: &Series,
    fill_gaps: bool,
) -> Result<Series> {
    let minutes = compute_interval(resampled)?;
    merge_columns(original, resampled, fill_gaps, |field| {
        Field::resampled(minutes, field.clone())
    })
}

fn merge_columns(
    original: &Series,
    resampled: &Series,
    fill_gaps: bool,
    rename: impl Fn(&Field) -> Field,
) -> Result<Series> {
    if original.len() < 2 {
        return Err(Error::IncompatibleSeries(format!(
            "original series needs at least 2 rows to infer its interval, got {}",
            original.len()
        )));
    }
    let base = compute_interval(original)?;
    if !resampled.is_sorted() {
        return Err(Error::IncompatibleSeries(
            "resampled series must be sorted by ascending date".into(),
        ));
    }

    let carried: Vec<(Field, &Column)> = resampled
        .columns()
        .filter(|(field, _)| !field.is_ohlcv())
        .map(|(field, column)| (rename(field), column))
        .collect();
    if let Some((field, _)) = carried.iter().find(|(field, _)| original.contains(field)) {
        return Err(Error::IncompatibleSeries(format!(
            "column '{field}' exists in both the original and the resampled series"
        )));
    }

    let offset = TimeDelta::minutes(base);
    let shifted: HashMap<DateTime<Utc>, usize> = resampled
        .dates()
        .iter()
        .enumerate()
        .map(|(j, label)| (*label - offset, j))
        .collect();
    let matches: Vec<Option<usize>> = original
        .dates()
        .iter()
        .map(|date| shifted.get(date).copied())
        .collect();

    debug!(
        rows = original.len(),
        buckets = resampled.len(),
        matched = matches.iter().filter(|m| m.is_some()).count(),
        columns = carried.len(),
        base_minutes = base,
        fill_gaps,
        "Merging resampled columns"
    );

    let mut merged = original.clone();
    for (field, source) in carried {
        merged.insert(field, join_column(&matches, source, fill_gaps))?;
    }
    Ok(merged)
}

/// Left join one column through the row matches, optionally forward-filling.
/// A matched row whose source value is missing keeps the previous value when
/// filling.
fn join_column(matches: &[Option<usize>], source: &Column, fill_gaps: bool) -> Column {
    let mut last = None;
    matches
        .iter()
        .map(|hit| {
            let value = hit.and_then(|j| source[j]);
            if !fill_gaps {
                return value;
            }
            if value.is_some() {
                last = value;
            }
            last
        })
        .collect()
}
