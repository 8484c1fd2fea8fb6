use chrono::TimeDelta;

use common::{Error, Result, Series};

use crate::interval::to_label;

/// Smallest strictly positive step between consecutive rows.
///
/// The minimum rather than the mean recovers the native granularity even when
/// some candles are missing; zero deltas from duplicated timestamps are
/// skipped.
fn min_positive_step(series: &Series) -> Option<TimeDelta> {
    series
        .dates()
        .windows(2)
        .map(|w| w[1] - w[0])
        .filter(|dt| *dt > TimeDelta::zero())
        .min()
}

/// Native sampling interval of `series`, in minutes.
///
/// # Errors
/// - `IncompatibleSeries` if there are fewer than two distinct consecutive
///   timestamps to compare.
/// - `InvalidInterval` if the smallest step is not a whole number of minutes.
pub fn compute_interval(series: &Series) -> Result<i64> {
    if series.len() < 2 {
        return Err(Error::IncompatibleSeries(format!(
            "need at least 2 rows to infer an interval, got {}",
            series.len()
        )));
    }
    let step = min_positive_step(series).ok_or_else(|| {
        Error::IncompatibleSeries("no strictly increasing timestamps to infer an interval".into())
    })?;

    let seconds = step.num_seconds();
    if seconds < 60 || seconds % 60 != 0 {
        return Err(Error::InvalidInterval(format!(
            "inferred step of {seconds}s is not a whole number of minutes"
        )));
    }
    Ok(seconds / 60)
}

/// Native sampling interval of `series` as a catalog label.
///
/// # Errors
/// Everything [`compute_interval`] returns, plus `UnknownInterval` when the
/// inferred minute count has no catalog label.
pub fn compute_interval_label(series: &Series) -> Result<&'static str> {
    to_label(compute_interval(series)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at_minutes(minutes: &[i64]) -> Series {
        Series::new(minutes.iter().map(|m| t(*m)).collect())
    }

    fn t(minute: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(minute * 60, 0).unwrap()
    }

    #[test]
    fn uniform_series() {
        let series = at_minutes(&[0, 5, 10, 15]);
        assert_eq!(compute_interval(&series).unwrap(), 5);
        assert_eq!(compute_interval_label(&series).unwrap(), "5m");
    }

    #[test]
    fn gaps_do_not_change_the_interval() {
        // 15m candles with two missing
        let series = at_minutes(&[0, 15, 60, 75, 120]);
        assert_eq!(compute_interval(&series).unwrap(), 15);
    }

    #[test]
    fn duplicated_timestamps_are_skipped() {
        let series = at_minutes(&[0, 0, 60, 60, 120]);
        assert_eq!(compute_interval(&series).unwrap(), 60);
        assert_eq!(compute_interval_label(&series).unwrap(), "1h");
    }

    #[test]
    fn daily_steps_count_whole_days() {
        let series = at_minutes(&[0, 1440, 2880]);
        assert_eq!(compute_interval(&series).unwrap(), 1440);
        assert_eq!(compute_interval_label(&series).unwrap(), "1d");
    }

    #[test]
    fn too_few_rows() {
        assert!(matches!(
            compute_interval(&at_minutes(&[0])),
            Err(Error::IncompatibleSeries(_))
        ));
        assert!(matches!(
            compute_interval(&at_minutes(&[3, 3, 3])),
            Err(Error::IncompatibleSeries(_))
        ));
    }

    #[test]
    fn sub_minute_step_is_rejected() {
        let series = Series::new(vec![
            Utc.timestamp_opt(0, 0).unwrap(),
            Utc.timestamp_opt(30, 0).unwrap(),
        ]);
        assert!(matches!(compute_interval(&series), Err(Error::InvalidInterval(_))));
    }

    #[test]
    fn uncatalogued_interval_has_no_label() {
        let series = at_minutes(&[0, 3, 6]);
        assert_eq!(compute_interval(&series).unwrap(), 3);
        assert!(matches!(
            compute_interval_label(&series),
            Err(Error::UnknownInterval(_))
        ));
    }
}
