use std::fmt;

/// Latency marks of a completed probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub url: String,
    pub http_status: u16,
    /// Time until response headers were available.
    pub ttfb_ms: u64,
    /// Time until the last body byte was read.
    pub total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success(ProbeResult),
    Failure { reason: FailureReason },
}

impl ProbeOutcome {
    pub fn failure(reason: FailureReason) -> Self {
        ProbeOutcome::Failure { reason }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Success(_))
    }
}

/// Why a probe produced no measurement. HTTP error statuses are not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    InvalidUrl,
    Timeout,
    FetchFailed,
    ResponseTooLarge,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::InvalidUrl => "invalid_url",
            FailureReason::Timeout => "timeout",
            FailureReason::FetchFailed => "fetch_failed",
            FailureReason::ResponseTooLarge => "response_too_large",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
