use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ClientBuildError {
    #[error("invalid proxy url {url}: {source}")]
    Proxy {
        url: String,
        #[source]
        source: wreq::Error,
    },
    #[error("failed to build http client: {0}")]
    Build(#[source] wreq::Error),
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Builds the upstream client once at startup; it is cloned into every
/// provider and pools connections internally.
pub fn shared_client(proxy: Option<&str>) -> Result<wreq::Client, ClientBuildError> {
    let mut builder = wreq::Client::builder().connect_timeout(CONNECT_TIMEOUT);
    if let Some(url) = proxy.map(str::trim).filter(|url| !url.is_empty()) {
        let proxy = wreq::Proxy::all(url).map_err(|source| ClientBuildError::Proxy {
            url: url.to_string(),
            source,
        })?;
        builder = builder.proxy(proxy);
    }
    builder.build().map_err(ClientBuildError::Build)
}
