use serde::{Deserialize, Serialize};

use super::types::Content;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateContentPath {
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateContentRequestBody {
    pub contents: Vec<Content>,
}

impl GenerateContentRequestBody {
    /// Single-turn body: `{"contents":[{"parts":[{"text": prompt}]}]}`.
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            contents: vec![Content::user_text(prompt)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateContentRequest {
    pub path: GenerateContentPath,
    pub body: GenerateContentRequestBody,
}

impl GenerateContentRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            path: GenerateContentPath {
                model: model.into(),
            },
            body: GenerateContentRequestBody::from_prompt(prompt),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn prompt_body_matches_upstream_shape() {
        let body = GenerateContentRequestBody::from_prompt("What is OCEAN?");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({ "contents": [ { "parts": [ { "text": "What is OCEAN?" } ] } ] })
        );
    }
}
