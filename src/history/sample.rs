use serde::{Deserialize, Serialize};

use crate::http_probe::result::ProbeResult;

/// One successful measurement as kept in a target's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Unix epoch milliseconds at which the probe finished.
    #[serde(rename = "ts")]
    pub timestamp_ms: i64,
    #[serde(rename = "status")]
    pub http_status: u16,
    pub ttfb_ms: u64,
    pub total_ms: u64,
}

impl Sample {
    pub fn from_result(result: &ProbeResult, timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            http_status: result.http_status,
            ttfb_ms: result.ttfb_ms,
            total_ms: result.total_ms,
        }
    }
}
