//! Artiface - turn a photo into AI-generated art from a style prompt.

mod adapters;
mod cassette;
mod cli;
mod config;
mod context;
mod error;
mod model;
mod normalize;
mod output;
mod ports;
mod session;

use std::path::Path;
use std::process;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;
use crate::context::ServiceContext;
use crate::error::ArtError;
use crate::model::{detect_provider, resolve_model};
use crate::normalize::Normalizer;
use crate::output::{resolve_output_path, save_image, validate_format};
use crate::ports::GenerationRequest;
use crate::session::GenerationSession;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "artiface=debug" } else { "artiface=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), ArtError> {
    let config = Config::load(&Config::locate(cli.config.as_deref()))?;
    let defaults = &config.defaults;

    let prompt = cli.resolve_prompt()?;

    let model_name = cli.model.as_deref().unwrap_or(&defaults.model);
    let resolved_model = resolve_model(model_name);
    let provider = detect_provider(&resolved_model).map_err(ArtError::InvalidArgument)?;
    tracing::debug!("Model: {resolved_model} (resolved from '{model_name}'), provider: {provider:?}");

    let format = cli.format.as_deref().unwrap_or(&defaults.format);
    validate_format(format).map_err(ArtError::InvalidArgument)?;

    let normalizer = Normalizer::new(
        cli.max_dimension.unwrap_or(defaults.max_dimension),
        cli.quality.unwrap_or(defaults.quality),
        cli.max_bytes.or(defaults.max_bytes),
    )?;
    let timeout = Duration::from_secs(cli.timeout.unwrap_or(defaults.timeout_secs));

    let upload = normalizer.normalize_file(&cli.image)?;
    tracing::info!("Prepared upload from {} ({} bytes)", cli.image.display(), upload.data.len());

    let output_path = resolve_output_path(cli.output.as_deref(), format);

    if cli.dry_run {
        save_image(&upload, format, &output_path)?;
        eprintln!("Saved: {}", output_path.display());
        return Ok(());
    }

    // Live, recording, or replaying
    let replay_path = std::env::var("ARTIFACE_REPLAY").ok();
    let is_recording = std::env::var("ARTIFACE_REC").is_ok_and(|v| v == "true" || v == "1");

    let (ctx, recording_session) = if let Some(ref cassette_path) = replay_path {
        tracing::debug!("Replaying from: {cassette_path}");
        (ServiceContext::replaying(Path::new(cassette_path))?, None)
    } else if is_recording {
        tracing::debug!("Recording mode enabled");
        let (ctx, session) = ServiceContext::recording(provider, &config, timeout)?;
        (ctx, Some(session))
    } else {
        (ServiceContext::live(provider, &config, timeout)?, None)
    };

    let session = GenerationSession::new(ctx.generator);
    let result = session.submit(GenerationRequest::new(resolved_model, upload, prompt)).await;
    tracing::debug!("Generation settled: {:?}", session.phase());
    drop(session);

    if let Some(recording) = recording_session {
        match recording.finish() {
            Ok(path) => eprintln!("Cassette saved: {}", path.display()),
            Err(e) => tracing::warn!("Failed to save cassette: {e}"),
        }
    }

    let image = result?;
    save_image(&image, format, &output_path)?;
    eprintln!("Saved: {}", output_path.display());

    Ok(())
}
