use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use http_body_util::{BodyExt, Limited};
use hyper::body::Body;
use hyper::{Method, Request, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use super::response::{self, JsonResponse};
use super::to_fixed_width;
use crate::config::Config;
use crate::history::{HistoryRecorder, HistoryStore, MAX_HISTORY};
use crate::http_probe::prelude::*;

/// Largest accepted request body for `POST /probe`.
const MAX_REQUEST_BYTES: usize = 16 * 1024;

/// Width of the target column in probe log lines.
const LOG_TARGET_WIDTH: usize = 48;

/// Query parameters of `GET /history`. `url` is accepted as an alias of `key`.
#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    key: Option<String>,
    url: Option<String>,
    /// Kept as text so an unparsable value falls back to the default limit.
    limit: Option<String>,
}

/// Shared state of the HTTP boundary.
pub struct AppState {
    pub prober: Prober,
    /// `None` when history is disabled; `/history` then answers 501.
    pub recorder: Option<HistoryRecorder>,
    pub probe_timeout: Duration,
    pub default_limit: usize,
}

impl AppState {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let prober = Prober::new(&config.probe)?;
        let recorder = config
            .history
            .enabled
            .then(|| HistoryRecorder::new(Arc::new(HistoryStore::new())));

        Ok(Self {
            prober,
            recorder,
            probe_timeout: config.probe.timeout(),
            default_limit: config.history.default_limit.clamp(1, MAX_HISTORY),
        })
    }
}

/// Route a request. Never fails; every error becomes a JSON response.
pub async fn handle<B>(state: Arc<AppState>, req: Request<B>) -> Result<JsonResponse, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::GET, "/api/ok") => response::ok(),
        (&Method::POST, "/probe") => probe(&state, req).await,
        (&Method::GET, "/history") => history(&state, req.uri().query().unwrap_or_default()),
        (_, "/api/ok" | "/probe" | "/history") => {
            response::error(StatusCode::METHOD_NOT_ALLOWED, "method_not_allowed")
        }
        _ => response::error(StatusCode::NOT_FOUND, "not_found"),
    };
    Ok(response)
}

async fn probe<B>(state: &AppState, req: Request<B>) -> JsonResponse
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let body = match Limited::new(req.into_body(), MAX_REQUEST_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            log::debug!("Unreadable probe request body: {e}");
            return response::error(StatusCode::BAD_REQUEST, "invalid_json");
        }
    };

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => return response::error(StatusCode::BAD_REQUEST, "invalid_json"),
    };

    let raw_url = match payload.get("url").and_then(Value::as_str).map(str::trim) {
        Some(url) if !url.is_empty() => url.to_string(),
        _ => return response::error(StatusCode::BAD_REQUEST, "invalid_url"),
    };

    let outcome = state.prober.probe(&raw_url, state.probe_timeout).await;
    finish_probe(state, &raw_url, &outcome)
}

/// Build the probe response, then hand successes to the history recorder.
fn finish_probe(state: &AppState, raw_url: &str, outcome: &ProbeOutcome) -> JsonResponse {
    let target = log_target(raw_url);
    let response = match outcome {
        ProbeOutcome::Success(result) => {
            log::info!(
                "✅ {target} status={} ttfb={}ms total={}ms",
                result.http_status,
                result.ttfb_ms,
                result.total_ms
            );
            response::probe_success(result)
        }
        ProbeOutcome::Failure { reason } => {
            log::info!("❌ {target} {reason}");
            response::probe_failure(*reason)
        }
    };

    if let Some(recorder) = &state.recorder {
        recorder.record(outcome);
    }
    response
}

/// Fixed-width log column for a caller supplied URL, with control characters
/// escaped so they cannot start a new log line.
fn log_target(raw_url: &str) -> String {
    to_fixed_width(&raw_url.escape_debug().to_string(), LOG_TARGET_WIDTH)
}

fn history(state: &AppState, query: &str) -> JsonResponse {
    let query: HistoryQuery = serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        log::debug!("Unusable history query {query:?}: {e}");
        HistoryQuery::default()
    });

    let key = match query.key.or(query.url) {
        Some(key) if !key.trim().is_empty() => key,
        _ => return response::error(StatusCode::BAD_REQUEST, "missing_url"),
    };

    let Some(recorder) = &state.recorder else {
        return response::error(StatusCode::NOT_IMPLEMENTED, "do_not_configured");
    };

    let limit = query
        .limit
        .and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or(state.default_limit as i64);

    match recorder.store().read(&key, limit) {
        Ok(samples) => response::history(&key, &samples),
        Err(e) => {
            log::error!("History read for {key:?} failed: {e}");
            response::error(StatusCode::INTERNAL_SERVER_ERROR, "history_unavailable")
        }
    }
}
