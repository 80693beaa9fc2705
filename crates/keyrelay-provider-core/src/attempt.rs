use std::fmt;
use std::time::Duration;

use http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Status(StatusCode),
    Api,
    Payload,
    Timeout,
    InvalidCredential,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Network => "network_error",
            FailureKind::Status(status) => match *status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "auth_error",
                StatusCode::TOO_MANY_REQUESTS => "rate_limit",
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => "upstream_unavailable",
                _ => "upstream_status",
            },
            FailureKind::Api => "api_error",
            FailureKind::Payload => "payload_error",
            FailureKind::Timeout => "timeout",
            FailureKind::InvalidCredential => "invalid_credential",
        }
    }
}

/// Why a single credential's attempt did not produce a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{detail}")]
pub struct AttemptFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl AttemptFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, detail)
    }

    pub fn status(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Status(status), detail)
    }

    pub fn api(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Api, detail)
    }

    pub fn payload(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Payload, detail)
    }

    pub fn timeout(limit: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("attempt timed out after {}ms", limit.as_millis()),
        )
    }

    pub fn invalid_credential(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidCredential, detail)
    }
}

/// Result of one credential's attempt. The chain inspects the tag to decide
/// whether to stop or move on to the next credential.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T> {
    Success(T),
    Failure(AttemptFailure),
}

impl<T> AttemptOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success(_))
    }
}

impl<T> From<Result<T, AttemptFailure>> for AttemptOutcome<T> {
    fn from(result: Result<T, AttemptFailure>) -> Self {
        match result {
            Ok(value) => AttemptOutcome::Success(value),
            Err(failure) => AttemptOutcome::Failure(failure),
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
