use axum::response::{IntoResponse, Response};
use axum::Json;
use http::header::ALLOW;
use http::{HeaderValue, StatusCode};
use keyrelay_provider_core::{InvalidRequest, RotationError};
use serde_json::json;

/// Errors that reach the caller. Individual attempt failures never do; they
/// are folded into [`RotationError::Exhausted`].
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Method Not Allowed")]
    MethodNotAllowed,
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequest),
    #[error(transparent)]
    Rotation(#[from] RotationError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::InvalidRequest(_) | ProxyError::Rotation(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ProxyError::MethodNotAllowed => (
                status,
                [(ALLOW, HeaderValue::from_static("POST"))],
                "Method Not Allowed",
            )
                .into_response(),
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}
