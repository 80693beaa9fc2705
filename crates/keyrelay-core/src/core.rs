use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;
use keyrelay_provider_core::{CredentialLookup, Provider, DEFAULT_ATTEMPT_TIMEOUT};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handler::{generate_handler, health_handler};

pub const DEFAULT_BODY_LIMIT: usize = 1024 * 1024;

pub struct CoreState {
    pub provider: Arc<dyn Provider>,
    pub credentials: CredentialLookup,
    /// Name passed to the credential lookup, e.g. `gemini` for `GEMINI_API_KEY`.
    pub credential_namespace: String,
    pub attempt_timeout: Option<Duration>,
}

pub struct Core {
    state: CoreState,
    body_limit: usize,
}

impl Core {
    pub fn new(provider: Arc<dyn Provider>, credentials: CredentialLookup) -> Self {
        let credential_namespace = provider.name().to_string();
        Self {
            state: CoreState {
                provider,
                credentials,
                credential_namespace,
                attempt_timeout: Some(DEFAULT_ATTEMPT_TIMEOUT),
            },
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    pub fn with_credential_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.state.credential_namespace = namespace.into();
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.state.attempt_timeout = timeout;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/generate", any(generate_handler))
            .route("/health", get(health_handler))
            .with_state(Arc::new(self.state))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(self.body_limit))
            .layer(TraceLayer::new_for_http())
    }
}
