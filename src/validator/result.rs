use std::fmt;

use url::Url;

/// Outcome of validating a user supplied probe target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// The target is a public HTTP(S) URL. `canonical_url` is the re-serialized
    /// parsed form and doubles as the history key.
    Accepted { canonical_url: Url },
    Rejected {
        reason: RejectReason,
        cause: RejectCause,
    },
}

impl ValidationResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationResult::Accepted { .. })
    }

    pub fn canonical_url(&self) -> Option<&Url> {
        match self {
            ValidationResult::Accepted { canonical_url } => Some(canonical_url),
            ValidationResult::Rejected { .. } => None,
        }
    }
}

/// Externally visible rejection code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidUrl,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::InvalidUrl => "invalid_url",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which rule rejected the target. Only used for logging and tests; callers
/// see a single `invalid_url` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectCause {
    Unparsable,
    UnsupportedScheme,
    BlockedHost,
    MalformedIpv4,
    PrivateIpv4,
    Ipv4Literal,
    PrivateIpv6,
}
