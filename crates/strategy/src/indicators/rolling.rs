//! Trailing-window primitives over [`Column`]s.
//!
//! A window is defined only once it holds `window` rows and none of them is
//! missing, matching the usual `rolling(window).max()` semantics.

use std::collections::{HashMap, VecDeque};

use common::Column;

/// Which extreme a rolling window tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extreme {
    Max,
    Min,
}

/// Rolling max or min using a monotonic deque of candidate indices.
pub fn rolling_extreme(values: &Column, window: usize, extreme: Extreme) -> Column {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    // Replaces the back of the deque when the new value is at least as extreme.
    let dominates = |new: f64, old: f64| match extreme {
        Extreme::Max => new >= old,
        Extreme::Min => new <= old,
    };

    let mut deque: VecDeque<(usize, f64)> = VecDeque::new();
    let mut last_missing: Option<usize> = None;

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => {
                while deque.back().is_some_and(|&(_, old)| dominates(*v, old)) {
                    deque.pop_back();
                }
                deque.push_back((i, *v));
            }
            None => last_missing = Some(i),
        }
        while deque.front().is_some_and(|&(j, _)| j + window <= i) {
            deque.pop_front();
        }

        let full = i + 1 >= window;
        let clean = last_missing.map_or(true, |m| m + window <= i);
        if full && clean {
            out[i] = deque.front().map(|&(_, v)| v);
        }
    }
    out
}

pub fn rolling_max(values: &Column, window: usize) -> Column {
    rolling_extreme(values, window, Extreme::Max)
}

pub fn rolling_min(values: &Column, window: usize) -> Column {
    rolling_extreme(values, window, Extreme::Min)
}

/// `(rolling_max(high) + rolling_min(low)) / 2`.
pub fn rolling_midpoint(high: &Column, low: &Column, window: usize) -> Column {
    midpoint(&rolling_max(high, window), &rolling_min(low, window))
}

/// Element-wise mean of two columns; missing if either side is.
pub fn midpoint(a: &Column, b: &Column) -> Column {
    a.iter()
        .zip(b)
        .map(|(x, y)| Some((x.as_ref()? + y.as_ref()?) / 2.0))
        .collect()
}

/// Shift values by `periods` rows: positive moves values later in time
/// (`out[i] = values[i - periods]`), negative moves them earlier
/// (`out[i] = values[i + |periods|]`). Vacated rows are missing.
pub fn shift(values: &Column, periods: isize) -> Column {
    (0..values.len())
        .map(|i| {
            let src = isize::try_from(i).ok()?.checked_sub(periods)?;
            values.get(usize::try_from(src).ok()?).copied().flatten()
        })
        .collect()
}

/// Memoised rolling extremes of the high and low columns of one series,
/// keyed by `(extreme, window)`.
pub struct RollingCache<'a> {
    high: &'a Column,
    low: &'a Column,
    windows: HashMap<(Extreme, usize), Column>,
}

impl<'a> RollingCache<'a> {
    pub fn new(high: &'a Column, low: &'a Column) -> Self {
        Self {
            high,
            low,
            windows: HashMap::new(),
        }
    }

    /// Rolling max of highs (`Extreme::Max`) or min of lows (`Extreme::Min`).
    pub fn get(&mut self, extreme: Extreme, window: usize) -> &Column {
        let source = match extreme {
            Extreme::Max => self.high,
            Extreme::Min => self.low,
        };
        self.windows
            .entry((extreme, window))
            .or_insert_with(|| rolling_extreme(source, window, extreme))
    }

    /// Donchian midpoint over `window`: `(max(high) + min(low)) / 2`.
    pub fn midpoint(&mut self, window: usize) -> Column {
        let highest = self.get(Extreme::Max, window).clone();
        midpoint(&highest, self.get(Extreme::Min, window))
    }

    /// Number of distinct windows computed so far.
    pub fn computed(&self) -> usize {
        self.windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(values: &[f64]) -> Column {
        values.iter().copied().map(Some).collect()
    }

    fn naive(values: &Column, window: usize, extreme: Extreme) -> Column {
        (0..values.len())
            .map(|i| {
                if i + 1 < window {
                    return None;
                }
                let slice = &values[i + 1 - window..=i];
                let defined: Option<Vec<f64>> = slice.iter().copied().collect();
                let defined = defined?;
                Some(match extreme {
                    Extreme::Max => defined.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    Extreme::Min => defined.iter().copied().fold(f64::INFINITY, f64::min),
                })
            })
            .collect()
    }

    #[test]
    fn rolling_max_and_min() {
        let values = col(&[3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0]);
        assert_eq!(
            rolling_max(&values, 3),
            vec![None, None, Some(4.0), Some(4.0), Some(5.0), Some(9.0), Some(9.0), Some(9.0)]
        );
        assert_eq!(
            rolling_min(&values, 3),
            vec![None, None, Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(2.0), Some(2.0)]
        );
    }

    #[test]
    fn matches_naive_window_scan() {
        let values = col(&[5.0, 7.0, 7.0, 2.0, 8.0, 8.0, 1.0, 3.0, 3.0, 9.0, 0.5, 4.0]);
        for window in 1..=6 {
            for extreme in [Extreme::Max, Extreme::Min] {
                assert_eq!(
                    rolling_extreme(&values, window, extreme),
                    naive(&values, window, extreme),
                    "window {window} {extreme:?}"
                );
            }
        }
    }

    #[test]
    fn missing_value_poisons_its_windows() {
        let mut values = col(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        values[2] = None;
        assert_eq!(
            rolling_max(&values, 2),
            vec![None, Some(2.0), None, None, Some(5.0), Some(6.0)]
        );
        assert_eq!(rolling_max(&values, 2), naive(&values, 2, Extreme::Max));
    }

    #[test]
    fn window_longer_than_series() {
        assert_eq!(rolling_max(&col(&[1.0, 2.0]), 5), vec![None, None]);
        assert_eq!(rolling_max(&col(&[1.0, 2.0]), 0), vec![None, None]);
    }

    #[test]
    fn shift_both_directions() {
        let values = col(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(shift(&values, 1), vec![None, Some(1.0), Some(2.0), Some(3.0)]);
        assert_eq!(shift(&values, -2), vec![Some(3.0), Some(4.0), None, None]);
        assert_eq!(shift(&values, 0), values);
        assert_eq!(shift(&values, 10), vec![None; 4]);
    }

    #[test]
    fn shift_by_extreme_periods_is_empty() {
        let values = col(&[1.0, 2.0, 3.0]);
        assert_eq!(shift(&values, isize::MAX), vec![None; 3]);
        assert_eq!(shift(&values, -isize::MAX), vec![None; 3]);
        assert_eq!(shift(&values, isize::MIN), vec![None; 3]);
    }

    #[test]
    fn cache_reuses_windows() {
        let high = col(&[2.0, 4.0, 6.0, 8.0]);
        let low = col(&[1.0, 1.0, 3.0, 5.0]);
        let mut cache = RollingCache::new(&high, &low);
        let mid = cache.midpoint(2);
        assert_eq!(mid, vec![None, Some(2.5), Some(3.5), Some(5.5)]);
        let _ = cache.midpoint(2);
        assert_eq!(cache.computed(), 2);
        assert_eq!(rolling_midpoint(&high, &low, 2), mid);
    }
}
