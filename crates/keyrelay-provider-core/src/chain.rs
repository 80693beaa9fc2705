use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::attempt::{AttemptFailure, AttemptOutcome};
use crate::credential::Credential;
use crate::provider::CallContext;

pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RotationError {
    #[error("Server Misconfiguration: No API Keys found.")]
    NoCredentials { provider: String },
    #[error("All API keys exhausted. Last error: {last_error}")]
    Exhausted {
        provider: String,
        attempts: usize,
        last_error: String,
    },
}

/// Ordered, immutable credential list for a single request.
#[derive(Debug, Clone)]
pub struct CredentialChain {
    provider: String,
    credentials: Vec<Credential>,
    attempt_timeout: Option<Duration>,
}

impl CredentialChain {
    pub fn new(provider: impl Into<String>, credentials: Vec<Credential>) -> Self {
        Self {
            provider: provider.into(),
            credentials,
            attempt_timeout: Some(DEFAULT_ATTEMPT_TIMEOUT),
        }
    }

    /// `None` lets an attempt run for as long as the upstream takes.
    pub fn with_attempt_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Runs `attempt` once per credential, in order, one at a time. The first
    /// success is returned and nothing after it is tried. When every attempt
    /// fails the error carries the detail of the last one.
    pub async fn execute<T, F, Fut>(
        &self,
        ctx: &CallContext,
        mut attempt: F,
    ) -> Result<T, RotationError>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = AttemptOutcome<T>>,
    {
        if self.credentials.is_empty() {
            warn!(
                event = "no_credentials",
                trace_id = %ctx.trace_id,
                provider = %self.provider
            );
            return Err(RotationError::NoCredentials {
                provider: self.provider.clone(),
            });
        }

        let total = self.credentials.len();
        let mut last_failure: Option<AttemptFailure> = None;
        for (index, credential) in self.credentials.iter().enumerate() {
            let masked = credential.masked();
            debug!(
                event = "attempt_start",
                trace_id = %ctx.trace_id,
                provider = %self.provider,
                credential = %masked,
                attempt = index + 1,
                total = total
            );
            let pending = attempt(credential.clone());
            let outcome = match self.attempt_timeout {
                Some(limit) => match tokio::time::timeout(limit, pending).await {
                    Ok(outcome) => outcome,
                    Err(_) => AttemptOutcome::Failure(AttemptFailure::timeout(limit)),
                },
                None => pending.await,
            };
            match outcome {
                AttemptOutcome::Success(value) => {
                    info!(
                        event = "attempt_succeeded",
                        trace_id = %ctx.trace_id,
                        provider = %self.provider,
                        credential = %masked,
                        attempt = index + 1,
                        total = total
                    );
                    return Ok(value);
                }
                AttemptOutcome::Failure(failure) => {
                    warn!(
                        event = "attempt_failed",
                        trace_id = %ctx.trace_id,
                        provider = %self.provider,
                        credential = %masked,
                        attempt = index + 1,
                        total = total,
                        reason = %failure.kind,
                        error = %failure.detail
                    );
                    last_failure = Some(failure);
                }
            }
        }

        let last_error = last_failure
            .map(|failure| failure.detail)
            .unwrap_or_default();
        warn!(
            event = "credentials_exhausted",
            trace_id = %ctx.trace_id,
            provider = %self.provider,
            attempts = total,
            error = %last_error
        );
        Err(RotationError::Exhausted {
            provider: self.provider.clone(),
            attempts: total,
            last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn chain(keys: &[&str]) -> CredentialChain {
        CredentialChain::new("gemini", keys.iter().map(|key| Credential::new(*key)).collect())
    }

    /// Replays `script` in call order and records which keys were used.
    async fn run(
        chain: &CredentialChain,
        script: Vec<AttemptOutcome<&'static str>>,
    ) -> (Result<&'static str, RotationError>, Vec<String>) {
        let calls = Mutex::new(Vec::new());
        let script = Mutex::new(script.into_iter());
        let ctx = CallContext::new("test");
        let result = chain
            .execute(&ctx, |credential| {
                calls.lock().unwrap().push(credential.expose().to_string());
                let outcome = script
                    .lock()
                    .unwrap()
                    .next()
                    .expect("more attempts than scripted outcomes");
                async move { outcome }
            })
            .await;
        (result, calls.into_inner().unwrap())
    }

    #[tokio::test]
    async fn first_success_stops_the_chain() {
        let (result, calls) = run(
            &chain(&["k1", "k2", "k3"]),
            vec![
                AttemptOutcome::Success("first"),
                AttemptOutcome::Success("second"),
            ],
        )
        .await;
        assert_eq!(result, Ok("first"));
        assert_eq!(calls, vec!["k1"]);
    }

    #[tokio::test]
    async fn failures_fall_through_to_the_next_credential_in_order() {
        for failures in 1..4usize {
            let keys: Vec<String> = (0..=failures).map(|i| format!("k{i}")).collect();
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let mut script: Vec<AttemptOutcome<&'static str>> = (0..failures)
                .map(|i| AttemptOutcome::Failure(AttemptFailure::api(format!("fail {i}"))))
                .collect();
            script.push(AttemptOutcome::Success("payload"));

            let (result, calls) = run(&chain(&key_refs), script).await;
            assert_eq!(result, Ok("payload"));
            assert_eq!(calls, keys);
        }
    }

    #[tokio::test]
    async fn empty_chain_fails_without_calling() {
        let (result, calls) = run(&chain(&[]), Vec::new()).await;
        assert_eq!(
            result,
            Err(RotationError::NoCredentials {
                provider: "gemini".to_string()
            })
        );
        assert!(calls.is_empty());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("No API Keys found")
        );
    }

    #[tokio::test]
    async fn exhaustion_reports_the_last_failure() {
        let (result, calls) = run(
            &chain(&["k1", "k2"]),
            vec![
                AttemptOutcome::Failure(AttemptFailure::status(
                    http::StatusCode::TOO_MANY_REQUESTS,
                    "Resource has been exhausted",
                )),
                AttemptOutcome::Failure(AttemptFailure::payload("expected value at line 1")),
            ],
        )
        .await;
        assert_eq!(calls, vec!["k1", "k2"]);
        let err = result.unwrap_err();
        assert_eq!(
            err,
            RotationError::Exhausted {
                provider: "gemini".to_string(),
                attempts: 2,
                last_error: "expected value at line 1".to_string(),
            }
        );
        assert_eq!(
            err.to_string(),
            "All API keys exhausted. Last error: expected value at line 1"
        );
    }

    #[tokio::test]
    async fn timed_out_attempt_moves_on() {
        let chain = chain(&["slow", "fast"]).with_attempt_timeout(Some(Duration::from_millis(50)));
        let calls = Mutex::new(Vec::new());
        let ctx = CallContext::new("test");
        let result = chain
            .execute(&ctx, |credential| {
                calls.lock().unwrap().push(credential.expose().to_string());
                async move {
                    if credential.expose() == "slow" {
                        tokio::time::sleep(Duration::from_secs(10)).await;
                    }
                    AttemptOutcome::Success(credential.expose().to_string())
                }
            })
            .await;
        assert_eq!(result, Ok("fast".to_string()));
        assert_eq!(calls.into_inner().unwrap(), vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn timed_out_last_attempt_is_the_reported_error() {
        let chain = chain(&["slow"]).with_attempt_timeout(Some(Duration::from_millis(20)));
        let ctx = CallContext::new("test");
        let result: Result<(), _> = chain
            .execute(&ctx, |_| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                AttemptOutcome::Success(())
            })
            .await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("attempt timed out after 20ms")
        );
    }
}
