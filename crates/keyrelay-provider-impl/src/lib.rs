pub mod client;
pub mod extract;
pub mod provider;
pub mod upstream;

pub use client::{shared_client, ClientBuildError};
pub use extract::{extract_payload, parse_generated_text, strip_code_fences, PayloadError};
pub use provider::{GeminiApiVersion, GeminiProvider, GeminiSettings};
