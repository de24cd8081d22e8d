mod cli;

use std::path::Path;
use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use image_converter_lib::{ConversionOptions, Session, view};
use cli::Cli;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_target(false)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn load_options(path: Option<&Path>) -> Result<ConversionOptions> {
    let Some(path) = path else {
        return Ok(ConversionOptions::default());
    };
    let json = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    ConversionOptions::from_json(&json)
        .with_context(|| format!("Invalid options file {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    init_tracing(cli.verbose);
    debug!("Parsed arguments: {:?}", cli);

    let options = cli.apply_overrides(load_options(cli.options.as_deref()).await?);
    let mut session = Session::new(options, &cli.batch_config()).context("Invalid configuration")?;
    let renderer = view::spawn(session.subscribe());

    let outcome = run(&mut session, &cli).await;

    drop(session);
    if let Err(e) = renderer.await {
        warn!("Renderer stopped unexpectedly: {}", e);
    }
    outcome
}

async fn run(session: &mut Session, cli: &Cli) -> Result<()> {
    session.select_paths(&cli.files).await.context("Failed to load selected files")?;
    if !session.state().can_convert() {
        warn!("No files selected, nothing to convert");
        return Ok(());
    }

    let report = session.convert().await.context("Conversion failed")?;

    if let Some(path) = &cli.report {
        let json = serde_json::to_string_pretty(&report)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    if !session.state().can_download() {
        warn!("No file converted successfully, nothing to save");
        return Ok(());
    }

    match cli.single {
        Some(position) => {
            session.download(position, &cli.output).await?;
        }
        None => {
            session.download_all(&cli.output).await?;
        }
    }
    Ok(())
}
