use keyrelay_protocol::gemini::ApiErrorResponse;
use keyrelay_protocol::gemini::generate_content::GenerateContentResponse;
use keyrelay_provider_core::AttemptFailure;
use serde_json::Value as JsonValue;

/// Used when the upstream reports an error without a message.
pub const GENERIC_API_ERROR: &str = "Gemini API Error";

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("upstream body is not JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),
    #[error("{0}")]
    Api(String),
    #[error("unexpected response envelope: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),
    #[error("response has no candidates")]
    NoCandidates,
    #[error("prompt blocked: {0}")]
    Blocked(String),
    #[error("first candidate has no text part")]
    MissingText,
    #[error("generated text is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

impl From<PayloadError> for AttemptFailure {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::Api(message) => AttemptFailure::api(message),
            other => AttemptFailure::payload(other.to_string()),
        }
    }
}

/// Pulls `candidates[0].content.parts[0].text` out of a 2xx body and parses
/// it as JSON. A body carrying an `error` object is rejected as an API error
/// even though the status was successful.
pub fn extract_payload(body: &[u8]) -> Result<JsonValue, PayloadError> {
    let value: JsonValue = serde_json::from_slice(body).map_err(PayloadError::InvalidBody)?;
    if let Some(api_error) = ApiErrorResponse::from_value(&value) {
        let message = api_error.message().unwrap_or(GENERIC_API_ERROR).to_string();
        return Err(PayloadError::Api(message));
    }

    let response: GenerateContentResponse =
        serde_json::from_value(value).map_err(PayloadError::InvalidEnvelope)?;
    if response.candidates.is_empty() {
        return Err(match response.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => PayloadError::Blocked(reason),
            None => PayloadError::NoCandidates,
        });
    }
    let text = response.first_text().ok_or(PayloadError::MissingText)?;
    parse_generated_text(text)
}

pub fn parse_generated_text(text: &str) -> Result<JsonValue, PayloadError> {
    serde_json::from_str(&strip_code_fences(text)).map_err(PayloadError::InvalidJson)
}

/// Drops every ```` ```json ```` and ```` ``` ```` marker, wherever it
/// appears, then trims.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(text: &str) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "candidates": [
                { "content": { "role": "model", "parts": [ { "text": text } ] }, "finishReason": "STOP" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn fenced_and_bare_json_parse_to_the_same_value() {
        let fenced = extract_payload(&envelope("```json\n{\"a\":1}\n```")).unwrap();
        let bare = extract_payload(&envelope("{\"a\":1}")).unwrap();
        assert_eq!(fenced, json!({ "a": 1 }));
        assert_eq!(bare, fenced);
    }

    #[test]
    fn untagged_fence_and_padding_are_stripped() {
        assert_eq!(strip_code_fences("  ```\n[1, 2]\n```  \n"), "[1, 2]");
        assert_eq!(
            parse_generated_text("\n```json{\"quiz\":[]}```").unwrap(),
            json!({ "quiz": [] })
        );
    }

    #[test]
    fn malformed_text_is_a_payload_failure() {
        let err = extract_payload(&envelope("not json")).unwrap_err();
        assert!(matches!(err, PayloadError::InvalidJson(_)));
        let failure = AttemptFailure::from(err);
        assert_eq!(failure.kind, keyrelay_provider_core::FailureKind::Payload);
        assert!(failure.detail.starts_with("generated text is not valid JSON"));
    }

    #[test]
    fn missing_nesting_is_reported() {
        let no_parts = serde_json::to_vec(&json!({ "candidates": [ { "content": { "parts": [] } } ] }))
            .unwrap();
        assert!(matches!(
            extract_payload(&no_parts).unwrap_err(),
            PayloadError::MissingText
        ));

        let no_content = serde_json::to_vec(&json!({ "candidates": [ { "finishReason": "SAFETY" } ] }))
            .unwrap();
        assert!(matches!(
            extract_payload(&no_content).unwrap_err(),
            PayloadError::MissingText
        ));

        assert!(matches!(
            extract_payload(b"{}").unwrap_err(),
            PayloadError::NoCandidates
        ));
        assert!(matches!(
            extract_payload(b"[1]").unwrap_err(),
            PayloadError::InvalidEnvelope(_)
        ));
        assert!(matches!(
            extract_payload(b"<html>").unwrap_err(),
            PayloadError::InvalidBody(_)
        ));
    }

    #[test]
    fn blocked_prompt_names_the_reason() {
        let body = serde_json::to_vec(&json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
            .unwrap();
        let err = extract_payload(&body).unwrap_err();
        assert_eq!(err.to_string(), "prompt blocked: SAFETY");
    }

    #[test]
    fn error_inside_success_body_is_an_api_failure() {
        let body = serde_json::to_vec(&json!({ "error": { "message": "API key expired" } })).unwrap();
        let failure = AttemptFailure::from(extract_payload(&body).unwrap_err());
        assert_eq!(failure, AttemptFailure::api("API key expired"));

        let bare = serde_json::to_vec(&json!({ "error": {} })).unwrap();
        let failure = AttemptFailure::from(extract_payload(&bare).unwrap_err());
        assert_eq!(failure.detail, GENERIC_API_ERROR);
    }
}
