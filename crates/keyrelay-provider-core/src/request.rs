use serde::Deserialize;

/// Inbound body: a JSON object with a required `prompt` string. Extra
/// fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid request body: {0}")]
pub struct InvalidRequest(#[from] serde_json::Error);

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    pub fn from_json(body: &[u8]) -> Result<Self, InvalidRequest> {
        Ok(serde_json::from_slice(body)?)
    }
}
