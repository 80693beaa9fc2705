use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use keyrelay_core::Core;
use keyrelay_provider_core::{env_lookup, load_credentials, EnvSource, KeyNaming};
use keyrelay_provider_impl::{shared_client, GeminiProvider};
use tracing::{info, warn};

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "dotenv loaded"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "dotenv ignored"),
    }
    if let Err(err) = run().await {
        eprintln!("keyrelay failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let naming = KeyNaming::new(cli.key_prefix.clone());

    let found = load_credentials(&EnvSource, &naming, &cli.provider).len();
    if found == 0 {
        warn!(
            provider = %cli.provider,
            primary = %naming.primary_key(&cli.provider),
            "no credentials configured; generate requests will fail"
        );
    } else {
        info!(provider = %cli.provider, credentials = found, "credentials found");
    }

    let client = shared_client(cli.proxy.as_deref()).context("building upstream client")?;
    let settings = cli.gemini_settings();
    info!(
        base_url = %settings.base_url,
        model = %settings.model,
        version = %settings.version,
        attempt_timeout_secs = cli.attempt_timeout_secs,
        proxy = %cli.proxy.as_deref().unwrap_or(""),
        "upstream configured"
    );
    let provider = Arc::new(GeminiProvider::new(client, settings));

    let app = Core::new(provider, env_lookup(naming))
        .with_credential_namespace(cli.provider.clone())
        .with_attempt_timeout(cli.attempt_timeout())
        .with_body_limit(cli.body_limit)
        .router();

    let bind = cli.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    info!("shut down");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("keyrelay=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
