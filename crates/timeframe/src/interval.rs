use common::{Error, Result};

/// Exchange interval labels and their length in minutes.
///
/// `1h` and `60m` share 60 minutes; reverse lookups return the first entry,
/// so 60 resolves to `1h`.
const TICKER_INTERVAL_MINUTES: [(&str, i64); 13] = [
    ("1m", 1),
    ("5m", 5),
    ("15m", 15),
    ("30m", 30),
    ("1h", 60),
    ("60m", 60),
    ("2h", 120),
    ("4h", 240),
    ("6h", 360),
    ("8h", 480),
    ("12h", 720),
    ("1d", 1440),
    ("1w", 10080),
];

/// The full catalog in table order.
pub fn catalog() -> &'static [(&'static str, i64)] {
    &TICKER_INTERVAL_MINUTES
}

pub fn to_minutes(label: &str) -> Result<i64> {
    TICKER_INTERVAL_MINUTES
        .iter()
        .find(|(l, _)| *l == label)
        .map(|(_, m)| *m)
        .ok_or_else(|| Error::UnknownInterval(format!("no catalog entry for label '{label}'")))
}

/// Exact reverse lookup; there is no nearest-match fallback.
pub fn to_label(minutes: i64) -> Result<&'static str> {
    TICKER_INTERVAL_MINUTES
        .iter()
        .find(|(_, m)| *m == minutes)
        .map(|(l, _)| *l)
        .ok_or_else(|| Error::UnknownInterval(format!("no catalog label for {minutes} minutes")))
}

/// An interval argument: either a raw minute count or a catalog label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval {
    Minutes(i64),
    Label(String),
}

impl Interval {
    /// Resolve to minutes. Labels go through the catalog; raw counts are
    /// returned as given and validated by the caller.
    pub fn minutes(&self) -> Result<i64> {
        match self {
            Interval::Minutes(m) => Ok(*m),
            Interval::Label(label) => to_minutes(label),
        }
    }
}

impl From<i64> for Interval {
    fn from(minutes: i64) -> Self {
        Interval::Minutes(minutes)
    }
}

impl From<&str> for Interval {
    fn from(label: &str) -> Self {
        Interval::Label(label.to_string())
    }
}

impl From<String> for Interval {
    fn from(label: String) -> Self {
        Interval::Label(label)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Interval::Minutes(m) => write!(f, "{m}min"),
            Interval::Label(label) => write!(f, "{label}"),
        }
    }
}
