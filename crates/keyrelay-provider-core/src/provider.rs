use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::attempt::AttemptOutcome;
use crate::credential::Credential;
use crate::request::GenerationRequest;

#[derive(Debug, Clone, Default)]
pub struct CallContext {
    pub trace_id: String,
}

impl CallContext {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
        }
    }
}

/// One upstream generation backend. `generate` performs exactly one call with
/// exactly one credential and reports the outcome; it never retries.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        req: &GenerationRequest,
        credential: &Credential,
        ctx: &CallContext,
    ) -> AttemptOutcome<JsonValue>;
}
