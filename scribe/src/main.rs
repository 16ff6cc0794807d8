#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use args::Args;
use clap::Parser;
use scribe_client::{AudioClient, CallOptions};
use scribe_config::Config;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(api_key) = args.api_key {
        config.client.api_key = Some(SecretString::from(api_key));
    }

    scribe_telemetry::init(&config.telemetry, args.log.as_deref())?;

    if let Some(path) = &args.config {
        tracing::debug!(config_path = %path.display(), "using configuration file");
    }

    let client = AudioClient::from_config(&config.client)?;

    let (operation, audio) = args.command.into_parts();
    let timeout = audio.timeout;
    let request = audio.into_request(&config.defaults).await?;

    // Cancel the in-flight request on Ctrl+C
    let cancellation = CancellationToken::new();
    let cancel_on_signal = cancellation.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling request");
            cancel_on_signal.cancel();
        }
    });

    let options = CallOptions {
        timeout,
        cancellation: Some(cancellation),
    };

    tracing::info!(%operation, model = %request.model, "submitting audio");

    let transcription = client.send(&request, operation, &options).await?;

    println!("{}", transcription.text);

    Ok(())
}
