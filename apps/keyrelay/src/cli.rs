use std::time::Duration;

use clap::Parser;
use keyrelay_core::DEFAULT_BODY_LIMIT;
use keyrelay_provider_impl::provider::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use keyrelay_provider_impl::{GeminiApiVersion, GeminiSettings};

#[derive(Debug, Clone, Parser)]
#[command(name = "keyrelay", version, about = "Key-rotating Gemini generation proxy")]
pub(crate) struct Cli {
    #[arg(long, env = "KEYRELAY_HOST", default_value = "127.0.0.1")]
    pub host: String,
    #[arg(long, env = "KEYRELAY_PORT", default_value_t = 8787)]
    pub port: u16,
    /// Credential namespace: `gemini` reads GEMINI_API_KEY, GEMINI_API_KEY_1..10.
    #[arg(long, env = "KEYRELAY_PROVIDER", default_value = "gemini")]
    pub provider: String,
    /// Prepended to every key name, e.g. `VITE_`.
    #[arg(long, env = "KEYRELAY_KEY_PREFIX", default_value = "")]
    pub key_prefix: String,
    #[arg(long, env = "KEYRELAY_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
    #[arg(long, env = "KEYRELAY_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,
    #[arg(long, env = "KEYRELAY_API_VERSION", default_value = "v1beta")]
    pub api_version: GeminiApiVersion,
    /// Per-key attempt timeout in seconds; 0 disables it.
    #[arg(long, env = "KEYRELAY_ATTEMPT_TIMEOUT_SECS", default_value_t = 30)]
    pub attempt_timeout_secs: u64,
    /// Outbound proxy for upstream calls (http, https or socks5 url).
    #[arg(long, env = "KEYRELAY_PROXY")]
    pub proxy: Option<String>,
    #[arg(long, env = "KEYRELAY_BODY_LIMIT", default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit: usize,
}

impl Cli {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        (self.attempt_timeout_secs > 0).then(|| Duration::from_secs(self.attempt_timeout_secs))
    }

    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            version: self.api_version,
        }
    }
}
