use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::history::Sample;
use crate::http_probe::result::{FailureReason, ProbeResult};

pub type JsonResponse = Response<Full<Bytes>>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    ok: bool,
    error: &'a str,
}

#[derive(Serialize)]
struct ProbeBody<'a> {
    ok: bool,
    url: &'a str,
    status: u16,
    ttfb_ms: u64,
    total_ms: u64,
}

#[derive(Serialize)]
struct HistoryBody<'a> {
    ok: bool,
    url: &'a str,
    history: &'a [Sample],
}

#[derive(Serialize)]
struct OkBody {
    ok: bool,
}

pub fn json<T: Serialize>(status: StatusCode, body: &T) -> JsonResponse {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            log::error!("Failed to serialize response body: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"ok":false,"error":"internal_error"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub fn error(status: StatusCode, code: &str) -> JsonResponse {
    json(
        status,
        &ErrorBody {
            ok: false,
            error: code,
        },
    )
}

pub fn ok() -> JsonResponse {
    json(StatusCode::OK, &OkBody { ok: true })
}

pub fn probe_success(result: &ProbeResult) -> JsonResponse {
    json(
        StatusCode::OK,
        &ProbeBody {
            ok: true,
            url: &result.url,
            status: result.http_status,
            ttfb_ms: result.ttfb_ms,
            total_ms: result.total_ms,
        },
    )
}

pub fn probe_failure(reason: FailureReason) -> JsonResponse {
    error(failure_status(reason), reason.as_str())
}

pub fn history(url: &str, samples: &[Sample]) -> JsonResponse {
    json(
        StatusCode::OK,
        &HistoryBody {
            ok: true,
            url,
            history: samples,
        },
    )
}

pub fn failure_status(reason: FailureReason) -> StatusCode {
    match reason {
        FailureReason::InvalidUrl => StatusCode::BAD_REQUEST,
        FailureReason::Timeout => StatusCode::REQUEST_TIMEOUT,
        FailureReason::ResponseTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        FailureReason::FetchFailed => StatusCode::BAD_GATEWAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_status_mapping() {
        assert_eq!(failure_status(FailureReason::InvalidUrl), StatusCode::BAD_REQUEST);
        assert_eq!(failure_status(FailureReason::Timeout), StatusCode::REQUEST_TIMEOUT);
        assert_eq!(
            failure_status(FailureReason::ResponseTooLarge),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(failure_status(FailureReason::FetchFailed), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_json_sets_content_type() {
        let response = ok();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
