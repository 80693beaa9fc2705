use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use keyrelay_protocol::gemini::generate_content::GenerateContentRequest;
use keyrelay_provider_core::{
    AttemptFailure, AttemptOutcome, CallContext, Credential, GenerationRequest, Provider,
};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::upstream::{handle_response, network_failure};

pub const PROVIDER_NAME: &str = "gemini";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeminiApiVersion {
    V1,
    #[default]
    V1Beta,
}

impl GeminiApiVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeminiApiVersion::V1 => "v1",
            GeminiApiVersion::V1Beta => "v1beta",
        }
    }
}

impl fmt::Display for GeminiApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeminiApiVersion {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "v1" => Ok(GeminiApiVersion::V1),
            "v1beta" => Ok(GeminiApiVersion::V1Beta),
            other => Err(format!("unknown gemini api version: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiSettings {
    pub base_url: String,
    pub model: String,
    pub version: GeminiApiVersion,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            version: GeminiApiVersion::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: wreq::Client,
    settings: GeminiSettings,
}

impl GeminiProvider {
    pub fn new(client: wreq::Client, settings: GeminiSettings) -> Self {
        Self { client, settings }
    }

    fn generate_path(&self) -> String {
        format!(
            "/{}/models/{}:generateContent",
            self.settings.version, self.settings.model
        )
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn generate(
        &self,
        req: &GenerationRequest,
        credential: &Credential,
        ctx: &CallContext,
    ) -> AttemptOutcome<JsonValue> {
        let api_key = credential.expose();
        if api_key.trim().is_empty() {
            return AttemptOutcome::Failure(AttemptFailure::invalid_credential("missing api_key"));
        }
        let request = GenerateContentRequest::new(self.settings.model.as_str(), req.prompt.as_str());
        let path = self.generate_path();
        let url = build_url(&self.settings.base_url, &path);
        let started_at = Instant::now();
        info!(
            event = "upstream_request",
            trace_id = %ctx.trace_id,
            provider = %PROVIDER_NAME,
            op = "gemini.generate",
            method = "POST",
            path = %path,
            model = %request.path.model,
            credential = %credential.masked()
        );
        let response = match self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&request.body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(
                    event = "upstream_response",
                    trace_id = %ctx.trace_id,
                    provider = %PROVIDER_NAME,
                    op = "gemini.generate",
                    status = "error",
                    elapsed_ms = started_at.elapsed().as_millis(),
                    error = %err
                );
                return AttemptOutcome::Failure(network_failure(err));
            }
        };
        info!(
            event = "upstream_response",
            trace_id = %ctx.trace_id,
            provider = %PROVIDER_NAME,
            op = "gemini.generate",
            status = %response.status().as_u16(),
            elapsed_ms = started_at.elapsed().as_millis()
        );
        handle_response(response, &ctx.trace_id).await
    }
}

fn build_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let mut path = path.trim_start_matches('/');
    if base.ends_with("/v1") && (path == "v1" || path.starts_with("v1/")) {
        path = path.trim_start_matches("v1/").trim_start_matches("v1");
    }
    if base.ends_with("/v1beta") && (path == "v1beta" || path.starts_with("v1beta/")) {
        path = path.trim_start_matches("v1beta/").trim_start_matches("v1beta");
    }
    format!("{base}/{path}")
}
