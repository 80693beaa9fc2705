use std::time::SystemTime;

use http::header::RETRY_AFTER;
use http::{HeaderMap, StatusCode};
use keyrelay_protocol::gemini::ApiErrorResponse;
use keyrelay_provider_core::{AttemptFailure, AttemptOutcome};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::extract::{extract_payload, GENERIC_API_ERROR};

pub fn network_failure(err: wreq::Error) -> AttemptFailure {
    AttemptFailure::network(err.to_string())
}

pub async fn handle_response(response: wreq::Response, trace_id: &str) -> AttemptOutcome<JsonValue> {
    let status = response.status();
    let headers = response.headers().clone();
    match response.bytes().await {
        Ok(body) => classify_response(status, &headers, &body, trace_id),
        Err(err) => AttemptOutcome::Failure(network_failure(err)),
    }
}

/// Non-2xx is a failure carrying the upstream message. A 2xx body still has
/// to survive payload extraction before it counts as a success.
pub fn classify_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    trace_id: &str,
) -> AttemptOutcome<JsonValue> {
    if !status.is_success() {
        return AttemptOutcome::Failure(status_failure(status, headers, body, trace_id));
    }
    extract_payload(body).map_err(AttemptFailure::from).into()
}

/// A 429 logs the upstream `Retry-After` hint. The next key is tried
/// immediately regardless.
pub fn status_failure(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    trace_id: &str,
) -> AttemptFailure {
    if status == StatusCode::TOO_MANY_REQUESTS {
        if let Some(seconds) = retry_after_seconds(headers) {
            info!(
                event = "rate_limited",
                trace_id = %trace_id,
                retry_after_secs = seconds
            );
        }
    }
    let message = serde_json::from_slice::<JsonValue>(body)
        .ok()
        .as_ref()
        .and_then(ApiErrorResponse::from_value)
        .and_then(|err| err.message().map(str::to_string))
        .unwrap_or_else(|| GENERIC_API_ERROR.to_string());
    AttemptFailure::status(status, message)
}

fn retry_after_seconds(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let value = value.trim();
            if let Ok(seconds) = value.parse::<u64>() {
                return Some(seconds);
            }
            if let Ok(when) = httpdate::parse_http_date(value) {
                return when
                    .duration_since(SystemTime::now())
                    .ok()
                    .map(|duration| duration.as_secs());
            }
            None
        })
}
