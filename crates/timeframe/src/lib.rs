//! Multi-timeframe plumbing: interval catalog, interval inference,
//! right-labelled resampling and the leak-free merge back onto the base
//! timeframe.

pub mod cache;
pub mod infer;
pub mod interval;
pub mod merge;
pub mod resample;

pub use cache::ResampleCache;
pub use infer::{compute_interval, compute_interval_label};
pub use interval::{catalog, to_label, to_minutes, Interval};
pub use merge::{resampled_merge, resampled_merge_tagged};
pub use resample::resample_to_interval;
