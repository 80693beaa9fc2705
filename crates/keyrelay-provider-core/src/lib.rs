pub mod attempt;
pub mod chain;
pub mod credential;
pub mod provider;
pub mod request;

pub use attempt::{AttemptFailure, AttemptOutcome, FailureKind};
pub use chain::{CredentialChain, RotationError, DEFAULT_ATTEMPT_TIMEOUT};
pub use credential::{
    env_lookup, fixed_lookup, load_credentials, ConfigSource, Credential, CredentialLookup,
    EnvSource, KeyNaming, MAX_SECONDARY_KEYS,
};
pub use provider::{CallContext, Provider};
pub use request::{GenerationRequest, InvalidRequest};
