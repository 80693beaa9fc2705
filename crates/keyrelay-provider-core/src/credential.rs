use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Highest numbered secondary key scanned after the primary one.
pub const MAX_SECONDARY_KEYS: usize = 10;

/// One upstream API key. The secret never shows up in `Debug` output; logs
/// use [`Credential::masked`] instead.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `...` followed by the last four characters. Keys of four characters
    /// or fewer are masked entirely.
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        if count <= 4 {
            return "...".to_string();
        }
        let tail: String = self.0.chars().skip(count - 4).collect();
        format!("...{tail}")
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.masked()).finish()
    }
}

/// Key-value view over process-wide configuration.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<String>;
}

/// Reads straight from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl ConfigSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

/// Variable naming for a provider's keys: `{prefix}{PROVIDER}_API_KEY` for
/// the primary key and `{prefix}{PROVIDER}_API_KEY_{n}` for `n` in
/// `1..=MAX_SECONDARY_KEYS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyNaming {
    pub prefix: String,
}

impl KeyNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn primary_key(&self, provider: &str) -> String {
        format!("{}{}_API_KEY", self.prefix, provider.to_ascii_uppercase())
    }

    pub fn secondary_key(&self, provider: &str, index: usize) -> String {
        format!("{}_{index}", self.primary_key(provider))
    }
}

/// Primary key first, then secondary keys in ascending index. Values are
/// trimmed; blank values and gaps are skipped. An empty result is not an
/// error here.
pub fn load_credentials<S>(source: &S, naming: &KeyNaming, provider: &str) -> Vec<Credential>
where
    S: ConfigSource + ?Sized,
{
    let keys = std::iter::once(naming.primary_key(provider)).chain(
        (1..=MAX_SECONDARY_KEYS).map(|index| naming.secondary_key(provider, index)),
    );
    keys.filter_map(|key| source.get(&key))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(Credential::new)
        .collect()
}

/// Maps a provider name to its ordered credential list.
pub type CredentialLookup = Arc<dyn Fn(&str) -> Vec<Credential> + Send + Sync>;

/// Lookup that re-reads the process environment on every call.
pub fn env_lookup(naming: KeyNaming) -> CredentialLookup {
    Arc::new(move |provider| load_credentials(&EnvSource, &naming, provider))
}

/// Lookup that returns the same list for every provider.
pub fn fixed_lookup(credentials: Vec<Credential>) -> CredentialLookup {
    Arc::new(move |_| credentials.clone())
}
