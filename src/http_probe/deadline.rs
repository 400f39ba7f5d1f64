use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::time::{Sleep, sleep};

/// Timer guarding a single probe.
///
/// Resolves once the timeout elapses. The timer is registered in `live` while
/// the guard exists and unregistered on drop, so every exit path of a probe
/// (completion, failure, expiry or the caller dropping the future) releases it.
pub struct Deadline {
    sleep: Pin<Box<Sleep>>,
    live: Arc<AtomicUsize>,
}

impl Deadline {
    pub fn start(timeout: Duration, live: &Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        Self {
            sleep: Box::pin(sleep(timeout)),
            live: Arc::clone(live),
        }
    }
}

impl Future for Deadline {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        self.sleep.as_mut().poll(cx)
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
