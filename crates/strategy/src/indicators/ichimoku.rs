use serde::Deserialize;

use common::{Column, Error, Field, Line, Result, Series};

use super::rolling::{midpoint, shift, RollingCache};

/// How Senkou Span A is formed before it is shifted forward.
///
/// Both forms exist in deployed strategies, so callers pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanAFormula {
    /// `(tenkan_sen + kijun_sen) / 2`, the textbook definition.
    TenkanKijun,
    /// `(tenkan_sen + tenkan_sen) / 2`, i.e. a shifted Tenkan-sen.
    TenkanOnly,
}

/// Ichimoku Kinko Hyo windows and shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IchimokuParams {
    pub tenkan_window: usize,
    pub kijun_window: usize,
    /// Rows both Senkou spans are plotted ahead.
    pub senkou_offset: usize,
    pub senkou_b_window: usize,
    /// Rows the Chikou span is plotted behind.
    pub chikou_offset: usize,
    pub span_a: SpanAFormula,
}

impl IchimokuParams {
    /// The classic 9 / 26 / 26 / 52 / 26 settings with the given Span A formula.
    pub fn standard(span_a: SpanAFormula) -> Self {
        Self {
            tenkan_window: 9,
            kijun_window: 26,
            senkou_offset: 26,
            senkou_b_window: 52,
            chikou_offset: 26,
            span_a,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, window) in [
            ("tenkan_window", self.tenkan_window),
            ("kijun_window", self.kijun_window),
            ("senkou_b_window", self.senkou_b_window),
        ] {
            if window == 0 {
                return Err(Error::InvalidParameter(format!("{name} must be at least 1")));
            }
        }
        offset("senkou_offset", self.senkou_offset)?;
        offset("chikou_offset", self.chikou_offset)?;
        Ok(())
    }
}

/// Row shift as a signed count; offsets beyond `isize::MAX` are rejected.
fn offset(name: &str, rows: usize) -> Result<isize> {
    isize::try_from(rows)
        .map_err(|_| Error::InvalidParameter(format!("{name} of {rows} rows is too large")))
}

/// The five Ichimoku lines, aligned to the source series' rows.
#[derive(Debug, Clone, PartialEq)]
pub struct IchimokuLines {
    pub tenkan_sen: Column,
    pub kijun_sen: Column,
    pub senkou_span_a: Column,
    pub senkou_span_b: Column,
    pub chikou_span: Column,
}

impl IchimokuLines {
    pub fn into_columns(self) -> Vec<(Field, Column)> {
        vec![
            (Field::Line(Line::TenkanSen), self.tenkan_sen),
            (Field::Line(Line::KijunSen), self.kijun_sen),
            (Field::Line(Line::SenkouSpanA), self.senkou_span_a),
            (Field::Line(Line::SenkouSpanB), self.senkou_span_b),
            (Field::Line(Line::ChikouSpan), self.chikou_span),
        ]
    }

    /// Write the lines into `series` as `Field::Line` columns.
    pub fn insert_into(self, series: &mut Series) -> Result<()> {
        for (field, column) in self.into_columns() {
            series.insert(field, column)?;
        }
        Ok(())
    }
}

/// Compute the Ichimoku lines of an OHLC series.
///
/// - Tenkan-sen and Kijun-sen are `(highest high + lowest low) / 2` over their
///   trailing windows; the first `window - 1` rows are missing.
/// - Senkou Span A (per [`SpanAFormula`]) and Senkou Span B (the midpoint over
///   `senkou_b_window`) are shifted forward by `senkou_offset` rows.
/// - Chikou span is the close shifted backward by `chikou_offset` rows, so the
///   last `chikou_offset` rows are missing. It reads future closes by
///   construction.
///
/// Rows outside a window or shift are `None`, never zero.
///
/// # Errors
/// `MissingField` if `high`, `low` or `close` is absent; `InvalidParameter`
/// for a zero window.
pub fn ichimoku(series: &Series, params: &IchimokuParams) -> Result<IchimokuLines> {
    params.validate()?;
    let high = series.require(&Field::High)?;
    let low = series.require(&Field::Low)?;
    let close = series.require(&Field::Close)?;

    let mut windows = RollingCache::new(high, low);
    let tenkan_sen = windows.midpoint(params.tenkan_window);
    let kijun_sen = windows.midpoint(params.kijun_window);
    let span_b = windows.midpoint(params.senkou_b_window);

    let span_a = match params.span_a {
        SpanAFormula::TenkanKijun => midpoint(&tenkan_sen, &kijun_sen),
        SpanAFormula::TenkanOnly => midpoint(&tenkan_sen, &tenkan_sen),
    };

    let forward = offset("senkou_offset", params.senkou_offset)?;
    let backward = offset("chikou_offset", params.chikou_offset)?;
    Ok(IchimokuLines {
        senkou_span_a: shift(&span_a, forward),
        senkou_span_b: shift(&span_b, forward),
        chikou_span: shift(close, -backward),
        tenkan_sen,
        kijun_sen,
    })
}

/// [`ichimoku`] as a reusable [`crate::Indicator`].
#[derive(Debug, Clone)]
pub struct Ichimoku {
    params: IchimokuParams,
}

impl Ichimoku {
    pub fn new(params: IchimokuParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &IchimokuParams {
        &self.params
    }
}

impl crate::Indicator for Ichimoku {
    fn name(&self) -> &str {
        "ichimoku"
    }

    fn compute(&self, series: &Series) -> Result<Vec<(Field, Column)>> {
        Ok(ichimoku(series, &self.params)?.into_columns())
    }
}
