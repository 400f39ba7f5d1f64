use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT_ENCODING, HeaderValue};
use reqwest::redirect::{Attempt, Policy};
use url::Url;

use super::deadline::Deadline;
use super::prelude::*;
use super::report;
use crate::config::ProbeConfig;
use crate::validator::prelude::*;

/// A redirect hop that pointed at a target the validator refuses.
#[derive(Debug, thiserror::Error)]
#[error("redirect to {url} blocked ({cause:?})")]
pub struct RedirectBlocked {
    pub url: String,
    pub cause: RejectCause,
}

/// Issues single GET probes against validated targets.
///
/// Cloning is cheap; clones share the connection pool and the deadline gauge.
#[derive(Clone)]
pub struct Prober {
    client: reqwest::Client,
    max_bytes: u64,
    live_deadlines: Arc<AtomicUsize>,
}

impl Prober {
    pub fn new(config: &ProbeConfig) -> Result<Self, reqwest::Error> {
        // Probes go direct; a system proxy would skew the timings.
        let client = reqwest::Client::builder()
            .no_proxy()
            .user_agent(config.user_agent.as_str())
            .redirect(redirect_policy(
                config.revalidate_redirects,
                config.max_redirects,
            ))
            .build()?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
            live_deadlines: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Number of probe deadlines currently armed.
    pub fn active_deadlines(&self) -> usize {
        self.live_deadlines.load(Ordering::SeqCst)
    }

    /// Validate `raw_url` and, if it is acceptable, measure it under `timeout`.
    /// Rejected targets return `invalid_url` without touching the network.
    pub async fn probe(&self, raw_url: &str, timeout: Duration) -> ProbeOutcome {
        match validate(raw_url) {
            ValidationResult::Accepted { canonical_url } => self.measure(canonical_url, timeout).await,
            ValidationResult::Rejected { reason, cause } => {
                log::debug!("Target {raw_url:?} rejected: {reason} ({cause:?})");
                ProbeOutcome::failure(FailureReason::InvalidUrl)
            }
        }
    }

    /// Measure an already validated URL.
    pub(crate) async fn measure(&self, url: Url, timeout: Duration) -> ProbeOutcome {
        let mut deadline = Deadline::start(timeout, &self.live_deadlines);
        let started = Instant::now();

        let result = tokio::select! {
            result = self.fetch(&url, started) => result,
            _ = &mut deadline => Err(FailureReason::Timeout),
        };
        drop(deadline);

        match result {
            Ok((http_status, ttfb, total)) => ProbeOutcome::Success(ProbeResult {
                url: url.to_string(),
                http_status,
                ttfb_ms: as_millis(ttfb),
                total_ms: as_millis(total),
            }),
            Err(reason) => ProbeOutcome::failure(reason),
        }
    }

    /// Returns the status code, the header latency and the full latency.
    async fn fetch(
        &self,
        url: &Url,
        started: Instant,
    ) -> Result<(u16, Duration, Duration), FailureReason> {
        let mut response = self
            .client
            .get(url.clone())
            .header(ACCEPT_ENCODING, HeaderValue::from_static("identity"))
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;
        let ttfb = started.elapsed();
        let http_status = response.status().as_u16();

        // The header is only a shortcut; the streamed count below is authoritative.
        if response.content_length().is_some_and(|len| len > self.max_bytes) {
            return Err(FailureReason::ResponseTooLarge);
        }

        let mut received: u64 = 0;
        while let Some(chunk) = response.chunk().await.map_err(|e| classify_error(url, &e))? {
            received += chunk.len() as u64;
            if received > self.max_bytes {
                log::debug!("Body of {url} exceeded {} bytes, aborting", self.max_bytes);
                return Err(FailureReason::ResponseTooLarge);
            }
        }

        Ok((http_status, ttfb, started.elapsed()))
    }
}

fn redirect_policy(revalidate: bool, max_redirects: usize) -> Policy {
    if !revalidate {
        return Policy::limited(max_redirects);
    }

    Policy::custom(move |attempt: Attempt| {
        if attempt.previous().len() >= max_redirects {
            return attempt.error("too many redirects");
        }
        match validate(attempt.url().as_str()) {
            ValidationResult::Accepted { .. } => attempt.follow(),
            ValidationResult::Rejected { cause, .. } => {
                let blocked = RedirectBlocked {
                    url: attempt.url().to_string(),
                    cause,
                };
                attempt.error(blocked)
            }
        }
    })
}

fn classify_error(url: &Url, err: &reqwest::Error) -> FailureReason {
    if is_blocked_redirect(err) {
        log::warn!("Probe of {url} redirected to a disallowed target: {}", report(err));
        return FailureReason::InvalidUrl;
    }
    if err.is_timeout() {
        return FailureReason::Timeout;
    }
    log::debug!("Probe of {url} failed: {}", report(err));
    FailureReason::FetchFailed
}

fn is_blocked_redirect(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(current) = source {
        if current.is::<RedirectBlocked>() {
            return true;
        }
        source = current.source();
    }
    false
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
