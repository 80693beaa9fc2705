use serde::{Deserialize, Serialize};

/// Error envelope returned by the Generative Language API, both on non-2xx
/// responses and occasionally inside a 200 body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ApiErrorResponse {
    /// Reads the `error` object out of an arbitrary JSON body, if present.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let error = value.get("error")?;
        if error.is_null() {
            return None;
        }
        let error = match error {
            serde_json::Value::String(message) => ApiError {
                message: Some(message.clone()),
                ..ApiError::default()
            },
            other => serde_json::from_value(other.clone()).unwrap_or_default(),
        };
        Some(Self { error })
    }

    pub fn message(&self) -> Option<&str> {
        self.error
            .message
            .as_deref()
            .filter(|message| !message.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn reads_message_from_error_body() {
        let body = json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        });
        let parsed = ApiErrorResponse::from_value(&body).unwrap();
        assert_eq!(parsed.error.code, Some(429));
        assert_eq!(parsed.message(), Some("Resource has been exhausted"));
    }

    #[test]
    fn string_error_is_used_as_message() {
        let body = json!({ "error": "quota" });
        let parsed = ApiErrorResponse::from_value(&body).unwrap();
        assert_eq!(parsed.message(), Some("quota"));
    }

    #[test]
    fn unexpected_error_shape_has_no_message() {
        let body = json!({ "error": 42 });
        let parsed = ApiErrorResponse::from_value(&body).unwrap();
        assert_eq!(parsed.message(), None);
    }

    #[test]
    fn absent_or_null_error_is_none() {
        assert!(ApiErrorResponse::from_value(&json!({ "candidates": [] })).is_none());
        assert!(ApiErrorResponse::from_value(&json!({ "error": null })).is_none());
    }
}
