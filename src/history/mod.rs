//! Bounded per-target probe history.
//!
//! - [`HistoryStore`]: per-key locked ring of the last [`MAX_HISTORY`] samples
//! - [`HistoryRecorder`]: fire-and-forget writer used by the HTTP boundary

pub mod recorder;
pub mod sample;
pub mod store;

pub use recorder::HistoryRecorder;
pub use sample::Sample;
pub use store::{HistoryError, HistoryStore, MAX_HISTORY, clamp_limit};
