pub mod config;
pub mod indicators;
pub mod pipeline;
pub mod registry;

pub use config::{IndicatorFileConfig, InformativeConfig, IntervalSetting};
pub use indicators::{ichimoku, Ichimoku, IchimokuLines, IchimokuParams, Rsi, SpanAFormula};
pub use pipeline::{informative, informative_cached, MergeOptions};
pub use registry::IndicatorRegistry;

use common::{Column, Field, Result, Series};

/// All indicator implementations must satisfy this trait.
pub trait Indicator: Send + Sync {
    /// Short identifier used in logs and config (e.g. "ichimoku").
    fn name(&self) -> &str;

    /// Compute the indicator's output columns, aligned to `series`' rows.
    fn compute(&self, series: &Series) -> Result<Vec<(Field, Column)>>;

    /// Compute and write the output columns into `series`.
    fn apply(&self, series: &mut Series) -> Result<()> {
        for (field, column) in self.compute(series)? {
            series.insert(field, column)?;
        }
        Ok(())
    }
}

/// Wraps an indicator so every output column is keyed under a set name.
///
/// Lets two parameter sets of the same indicator share one timeframe, such as
/// a buy and a `sell` Ichimoku.
pub struct NamedSet {
    set: String,
    inner: Box<dyn Indicator>,
}

impl NamedSet {
    pub fn new(set: impl Into<String>, inner: Box<dyn Indicator>) -> Self {
        Self {
            set: set.into(),
            inner,
        }
    }

    pub fn set(&self) -> &str {
        &self.set
    }
}

impl Indicator for NamedSet {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn compute(&self, series: &Series) -> Result<Vec<(Field, Column)>> {
        Ok(self
            .inner
            .compute(series)?
            .into_iter()
            .map(|(field, column)| (Field::named(self.set.as_str(), field), column))
            .collect())
    }
}
