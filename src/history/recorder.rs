use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Utc;
use tokio::sync::Notify;

use super::sample::Sample;
use super::store::HistoryStore;
use crate::http_probe::result::{ProbeOutcome, ProbeResult};

/// Writes successful probe results to the history without blocking the caller.
///
/// Each write runs on a detached task. Failures are logged and never reach
/// the probe response. `drain` waits for outstanding writes, which the binary
/// uses on shutdown and tests use to observe the store deterministically.
#[derive(Clone)]
pub struct HistoryRecorder {
    store: Arc<HistoryStore>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl HistoryRecorder {
    pub fn new(store: Arc<HistoryStore>) -> Self {
        Self {
            store,
            pending: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    /// Queue a history write for a successful outcome. Failures are ignored.
    /// Returns whether a write was scheduled.
    pub fn record(&self, outcome: &ProbeOutcome) -> bool {
        match outcome {
            ProbeOutcome::Success(result) => {
                self.record_result(result);
                true
            }
            ProbeOutcome::Failure { .. } => false,
        }
    }

    fn record_result(&self, result: &ProbeResult) {
        let key = result.url.clone();
        let sample = Sample::from_result(result, Utc::now().timestamp_millis());
        let store = Arc::clone(&self.store);
        let pending = Arc::clone(&self.pending);
        let idle = Arc::clone(&self.idle);

        pending.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            match store.append(&key, sample) {
                Ok(len) => log::debug!("Stored sample for {key} ({len} kept)"),
                Err(e) => log::error!("Failed to store sample for {key}: {e}"),
            }
            if pending.fetch_sub(1, Ordering::SeqCst) == 1 {
                idle.notify_waiters();
            }
        });
    }

    /// Writes scheduled but not yet applied.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Wait until every scheduled write has been applied.
    pub async fn drain(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending() == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_probe::result::FailureReason;

    fn success(url: &str, ttfb_ms: u64) -> ProbeOutcome {
        ProbeOutcome::Success(ProbeResult {
            url: url.to_string(),
            http_status: 200,
            ttfb_ms,
            total_ms: ttfb_ms + 5,
        })
    }

    #[tokio::test]
    async fn test_successes_are_stored_after_drain() {
        let recorder = HistoryRecorder::new(Arc::new(HistoryStore::new()));
        for n in 0..10 {
            assert!(recorder.record(&success("https://example.com/", n)));
        }
        recorder.drain().await;

        assert_eq!(recorder.pending(), 0);
        let samples = recorder.store().read("https://example.com/", 200).unwrap();
        assert_eq!(samples.len(), 10);
        assert!(samples.iter().all(|s| s.total_ms == s.ttfb_ms + 5));
    }

    #[tokio::test]
    async fn test_failures_are_not_stored() {
        let recorder = HistoryRecorder::new(Arc::new(HistoryStore::new()));
        assert!(!recorder.record(&ProbeOutcome::failure(FailureReason::Timeout)));
        recorder.drain().await;
        assert_eq!(recorder.store().targets(), 0);
    }

    #[tokio::test]
    async fn test_drain_without_writes_returns() {
        let recorder = HistoryRecorder::new(Arc::new(HistoryStore::new()));
        recorder.drain().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_parallel_writers_on_one_key() {
        let recorder = HistoryRecorder::new(Arc::new(HistoryStore::new()));
        let mut handles = Vec::new();
        for n in 0..100 {
            let recorder = recorder.clone();
            handles.push(tokio::spawn(async move {
                recorder.record(&success("https://example.com/busy", n));
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        recorder.drain().await;

        let mut ttfbs: Vec<u64> = recorder
            .store()
            .read("https://example.com/busy", 200)
            .unwrap()
            .iter()
            .map(|s| s.ttfb_ms)
            .collect();
        ttfbs.sort_unstable();
        assert_eq!(ttfbs, (0..100).collect::<Vec<_>>());
    }
}
