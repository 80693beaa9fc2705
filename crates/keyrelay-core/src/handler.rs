use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use keyrelay_provider_core::{CallContext, CredentialChain, GenerationRequest};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::core::CoreState;
use crate::error::ProxyError;

pub async fn generate_handler(
    State(state): State<Arc<CoreState>>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method != Method::POST {
        return ProxyError::MethodNotAllowed.into_response();
    }

    let ctx = CallContext::new(trace_id(&headers));
    match generate(&state, &body, &ctx).await {
        Ok(payload) => {
            info!(event = "downstream_response", trace_id = %ctx.trace_id, status = 200);
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(err) => {
            warn!(
                event = "downstream_response",
                trace_id = %ctx.trace_id,
                status = err.status().as_u16(),
                error = %err
            );
            err.into_response()
        }
    }
}

pub async fn health_handler() -> &'static str {
    "ok"
}

async fn generate(
    state: &CoreState,
    body: &[u8],
    ctx: &CallContext,
) -> Result<JsonValue, ProxyError> {
    let request = GenerationRequest::from_json(body)?;
    let credentials = (state.credentials)(&state.credential_namespace);
    let chain = CredentialChain::new(state.credential_namespace.as_str(), credentials)
        .with_attempt_timeout(state.attempt_timeout);

    let provider = state.provider.as_ref();
    let request = &request;
    let payload = chain
        .execute(ctx, |credential| async move {
            provider.generate(request, &credential, ctx).await
        })
        .await?;
    Ok(payload)
}

fn trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .or_else(|| headers.get("request-id"))
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}
