use common::{Column, Error, Field, Line, Result, Series};

/// RSI (Relative Strength Index) indicator.
///
/// Uses Wilder's smoothed moving average (same as TradingView / standard RSI).
/// Row `i` is defined once `period + 1` consecutive closes up to `i` are known.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Result<Self> {
        if period < 2 {
            return Err(Error::InvalidParameter(format!(
                "RSI period must be >= 2, got {period}"
            )));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn field(&self) -> Field {
        Field::Line(Line::Rsi {
            period: self.period,
        })
    }

    /// RSI per row of `closes` (oldest first). A missing close restarts the
    /// warm-up after it.
    pub fn compute_column(&self, closes: &Column) -> Column {
        let mut out = vec![None; closes.len()];
        let mut start = 0;
        while start < closes.len() {
            if closes[start].is_none() {
                start += 1;
                continue;
            }
            // Each contiguous run of defined closes warms up on its own.
            let end = closes[start..]
                .iter()
                .position(Option::is_none)
                .map_or(closes.len(), |p| start + p);
            let run: Vec<f64> = closes[start..end].iter().flatten().copied().collect();
            self.fill_run(&run, &mut out[start..end]);
            start = end;
        }
        out
    }

    fn fill_run(&self, closes: &[f64], out: &mut [Option<f64>]) {
        if closes.len() < self.period + 1 {
            return;
        }
        let p = self.period as f64;

        // First average gain/loss over the initial `period` changes
        let changes: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
        let initial = &changes[..self.period];
        let mut avg_gain = initial.iter().filter(|&&c| c > 0.0).sum::<f64>() / p;
        let mut avg_loss = initial.iter().filter(|&&c| c < 0.0).map(|c| c.abs()).sum::<f64>() / p;
        out[self.period] = Some(rsi_value(avg_gain, avg_loss));

        // Wilder smoothing over remaining changes
        for (k, &change) in changes.iter().enumerate().skip(self.period) {
            let gain = if change > 0.0 { change } else { 0.0 };
            let loss = if change < 0.0 { change.abs() } else { 0.0 };
            avg_gain = (avg_gain * (p - 1.0) + gain) / p;
            avg_loss = (avg_loss * (p - 1.0) + loss) / p;
            out[k + 1] = Some(rsi_value(avg_gain, avg_loss));
        }
    }
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

impl crate::Indicator for Rsi {
    fn name(&self) -> &str {
        "rsi"
    }

    fn compute(&self, series: &Series) -> Result<Vec<(Field, Column)>> {
        let closes = series.require(&Field::Close)?;
        Ok(vec![(self.field(), self.compute_column(closes))])
    }
}
