//! feather-validate
//!
//! Validates one Feather session token and prints the resulting session as
//! JSON. The token is read from the first argument, or from stdin when no
//! argument is given.

use anyhow::{bail, Context};
use common::config::{LogFormat, ObservabilityConfig};
use feather_client::{Client, Config, FeatherError};
use std::io::Read;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing(&ObservabilityConfig::from_env());

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<FeatherError>() {
                Some(feather) => eprintln!(
                    "{}/{}: {}",
                    feather.error_type().unwrap_or("error"),
                    feather.code().unwrap_or("unknown"),
                    feather
                ),
                None => eprintln!("error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_new(&observability.log_filter)
        .unwrap_or_else(|_| EnvFilter::new(common::config::DEFAULT_LOG_FILTER));

    let registry = tracing_subscriber::registry().with(filter);
    match observability.log_format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;
    info!(host = %config.host, "Configuration loaded");

    let token = read_token()?;
    let client = Client::new(&config)?;

    let session = client.sessions().validate(&token).await.map_err(|e| {
        error!(error = %e, "Session validation failed");
        e
    })?;

    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

fn read_token() -> anyhow::Result<String> {
    let token = match std::env::args().nth(1) {
        Some(token) => token,
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read token from stdin")?;
            input
        }
    };

    let token = token.trim().to_string();
    if token.is_empty() {
        bail!("usage: feather-validate [TOKEN]");
    }
    Ok(token)
}
