pub mod ichimoku;
pub mod rolling;
pub mod rsi;

pub use ichimoku::{ichimoku, Ichimoku, IchimokuLines, IchimokuParams, SpanAFormula};
pub use rsi::Rsi;
