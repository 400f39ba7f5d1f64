use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, RwLock};

use super::sample::Sample;

/// Samples kept per target; older ones are evicted first.
pub const MAX_HISTORY: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    /// A writer panicked while holding the lock of this record.
    #[error("history record for {key} is poisoned")]
    Poisoned { key: String },

    #[error("history index is poisoned")]
    IndexPoisoned,
}

type Record = Arc<Mutex<VecDeque<Sample>>>;

/// In-memory history keyed by canonical target URL.
///
/// Every key owns its own lock, created on first append. The outer index is
/// only locked long enough to find or insert a record, so work on one target
/// never waits for another.
#[derive(Debug, Default)]
pub struct HistoryStore {
    records: RwLock<HashMap<String, Record>>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `sample` to the history of `key` and return the new length.
    pub fn append(&self, key: &str, sample: Sample) -> Result<usize, HistoryError> {
        let record = self.record(key)?;
        let mut samples = record.lock().map_err(|_| HistoryError::Poisoned {
            key: key.to_string(),
        })?;

        samples.push_back(sample);
        while samples.len() > MAX_HISTORY {
            samples.pop_front();
        }
        Ok(samples.len())
    }

    /// Up to `limit` most recent samples for `key`, oldest first.
    /// `limit` is clamped to `1..=MAX_HISTORY`; unknown keys yield nothing.
    pub fn read(&self, key: &str, limit: i64) -> Result<Vec<Sample>, HistoryError> {
        let limit = clamp_limit(limit);
        let Some(record) = self.existing(key)? else {
            return Ok(Vec::new());
        };

        let samples = record.lock().map_err(|_| HistoryError::Poisoned {
            key: key.to_string(),
        })?;
        let skip = samples.len().saturating_sub(limit);
        Ok(samples.iter().skip(skip).copied().collect())
    }

    /// Number of targets with at least one sample.
    pub fn targets(&self) -> usize {
        self.records.read().map(|index| index.len()).unwrap_or(0)
    }

    fn existing(&self, key: &str) -> Result<Option<Record>, HistoryError> {
        let index = self.records.read().map_err(|_| HistoryError::IndexPoisoned)?;
        Ok(index.get(key).cloned())
    }

    fn record(&self, key: &str) -> Result<Record, HistoryError> {
        if let Some(record) = self.existing(key)? {
            return Ok(record);
        }
        let mut index = self.records.write().map_err(|_| HistoryError::IndexPoisoned)?;
        Ok(Arc::clone(index.entry(key.to_string()).or_default()))
    }
}

/// Clamp a caller supplied limit into `1..=MAX_HISTORY`.
pub fn clamp_limit(limit: i64) -> usize {
    limit.clamp(1, MAX_HISTORY as i64) as usize
}
