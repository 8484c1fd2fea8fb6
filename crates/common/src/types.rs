use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// One OHLCV candle as delivered by the bot engine's data loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Open time of the candle.
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// A numeric column. `None` marks a value that is undefined at that row
/// (indicator warm-up, shifted-out rows, unmatched merge rows).
pub type Column = Vec<Option<f64>>;

/// Indicator outputs, keyed by what they measure rather than by a built string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Line {
    TenkanSen,
    KijunSen,
    SenkouSpanA,
    SenkouSpanB,
    ChikouSpan,
    Rsi { period: usize },
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Line::TenkanSen => write!(f, "tenkan_sen"),
            Line::KijunSen => write!(f, "kijun_sen"),
            Line::SenkouSpanA => write!(f, "senkou_span_a"),
            Line::SenkouSpanB => write!(f, "senkou_span_b"),
            Line::ChikouSpan => write!(f, "chikou_span"),
            Line::Rsi { period } => write!(f, "rsi_{period}"),
        }
    }
}

/// Column key of a [`Series`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
    Line(Line),
    /// A column carried over from a series resampled to `minutes`.
    Resampled { minutes: i64, field: Box<Field> },
    /// A column of one named parameter set, e.g. the `sell` Ichimoku lines
    /// next to the default set on the same timeframe.
    Named { set: String, field: Box<Field> },
    Custom(String),
}

impl Field {
    /// The raw price/volume columns every OHLCV series carries.
    pub const OHLCV: [Field; 5] = [Field::Open, Field::High, Field::Low, Field::Close, Field::Volume];

    /// True for the raw candle columns, which never survive a merge.
    pub fn is_ohlcv(&self) -> bool {
        matches!(
            self,
            Field::Open | Field::High | Field::Low | Field::Close | Field::Volume
        )
    }

    pub fn resampled(minutes: i64, field: Field) -> Self {
        Field::Resampled {
            minutes,
            field: Box::new(field),
        }
    }

    pub fn named(set: impl Into<String>, field: impl Into<Field>) -> Self {
        Field::Named {
            set: set.into(),
            field: Box::new(field.into()),
        }
    }
}

impl From<Line> for Field {
    fn from(line: Line) -> Self {
        Field::Line(line)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Open => write!(f, "open"),
            Field::High => write!(f, "high"),
            Field::Low => write!(f, "low"),
            Field::Close => write!(f, "close"),
            Field::Volume => write!(f, "volume"),
            Field::Line(line) => write!(f, "{line}"),
            Field::Resampled { minutes, field } => write!(f, "resample_{minutes}_{field}"),
            Field::Named { set, field } => write!(f, "{set}_{field}"),
            Field::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Column-oriented timeseries: one date index plus any number of numeric
/// columns of the same length.
///
/// Rows are expected in ascending date order; the timeframe operations check
/// this with [`Series::is_sorted`] and refuse unsorted input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    dates: Vec<DateTime<Utc>>,
    columns: BTreeMap<Field, Column>,
}

impl Series {
    /// An index with no columns yet.
    pub fn new(dates: Vec<DateTime<Utc>>) -> Self {
        Self {
            dates,
            columns: BTreeMap::new(),
        }
    }

    pub fn from_candles(candles: &[Candle]) -> Self {
        fn pick(candles: &[Candle], f: impl Fn(&Candle) -> f64) -> Column {
            candles.iter().map(|c| Some(f(c))).collect()
        }

        let mut series = Self::new(candles.iter().map(|c| c.date).collect());
        series.columns.insert(Field::Open, pick(candles, |c| c.open));
        series.columns.insert(Field::High, pick(candles, |c| c.high));
        series.columns.insert(Field::Low, pick(candles, |c| c.low));
        series.columns.insert(Field::Close, pick(candles, |c| c.close));
        series.columns.insert(Field::Volume, pick(candles, |c| c.volume));
        series
    }

    /// Builder form of [`Series::insert`].
    pub fn with_column(mut self, field: impl Into<Field>, column: Column) -> Result<Self> {
        self.insert(field, column)?;
        Ok(self)
    }

    /// Insert or replace a column. The column must match the index length.
    pub fn insert(&mut self, field: impl Into<Field>, column: Column) -> Result<()> {
        let field = field.into();
        if column.len() != self.dates.len() {
            return Err(Error::IncompatibleSeries(format!(
                "column '{field}' has {} values but the series has {} rows",
                column.len(),
                self.dates.len()
            )));
        }
        self.columns.insert(field, column);
        Ok(())
    }

    pub fn remove(&mut self, field: &Field) -> Option<Column> {
        self.columns.remove(field)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn dates(&self) -> &[DateTime<Utc>] {
        &self.dates
    }

    pub fn contains(&self, field: &Field) -> bool {
        self.columns.contains_key(field)
    }

    pub fn column(&self, field: &Field) -> Option<&Column> {
        self.columns.get(field)
    }

    /// Like [`Series::column`], but a missing column is an error.
    pub fn require(&self, field: &Field) -> Result<&Column> {
        self.columns
            .get(field)
            .ok_or_else(|| Error::MissingField(field.clone()))
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.columns.keys()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&Field, &Column)> {
        self.columns.iter()
    }

    /// True when dates never decrease.
    pub fn is_sorted(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] <= w[1])
    }

    /// Render rows as JSON objects: `date` as RFC 3339 plus one key per column,
    /// with `null` for undefined values.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let mut row = Map::new();
                row.insert("date".to_string(), Value::String(date.to_rfc3339()));
                for (field, column) in &self.columns {
                    row.insert(field.to_string(), Value::from(column[i]));
                }
                row
            })
            .collect()
    }
}
