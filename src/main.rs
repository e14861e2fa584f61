//! Mediaflow - Video Enhancement Pipeline
//!
//! Entry point: HTTP upload server plus local processing commands.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use mediaflow::cli::{Args, Commands};
use mediaflow::config::Config;
use mediaflow::server;
use mediaflow::workflow::Workflow;

const DEFAULT_CONFIG: &str = "mediaflow.toml";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _guard = setup_logging(args.verbose)?;
    info!("Starting Mediaflow");

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new(DEFAULT_CONFIG).exists() {
                info!("Found {} in current directory, loading...", DEFAULT_CONFIG);
                Config::from_file(DEFAULT_CONFIG)?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Serve { bind, upload_dir } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if let Some(upload_dir) = upload_dir {
                config.server.upload_dir = upload_dir;
            }

            let workflow = Workflow::new(&config);
            workflow
                .check_availability()
                .await
                .context("External tools are not available")?;
            server::serve(&config, workflow).await?;
        }
        Commands::Process { input, json } => {
            let workflow = Workflow::new(&config);

            let progress = ProgressBar::new_spinner();
            progress.set_style(
                ProgressStyle::with_template("{spinner} [{elapsed_precise}] {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            progress.enable_steady_tick(Duration::from_millis(120));

            let result = workflow
                .process_observed(&input, |index, total, stage| {
                    progress.set_message(format!("[{}/{}] {}", index, total, stage));
                })
                .await;

            match result {
                Ok(output) => {
                    progress.finish_with_message("done");
                    if json {
                        println!("{}", serde_json::to_string_pretty(&output)?);
                    } else {
                        println!("{}", output.final_path.display());
                    }
                }
                Err(e) => {
                    progress.abandon_with_message("failed");
                    return Err(e).with_context(|| format!("Processing {} failed", input.display()));
                }
            }
        }
        Commands::Batch { input_dir } => {
            let workflow = Workflow::new(&config);
            let results = workflow.process_directory(&input_dir).await?;

            let failed = results.iter().filter(|(_, result)| result.is_err()).count();
            for (path, result) in &results {
                match result {
                    Ok(output) => {
                        println!("ok     {} -> {}", path.display(), output.final_path.display())
                    }
                    Err(e) => println!("failed {}: {}", path.display(), e),
                }
            }
            println!("{} processed, {} failed", results.len() - failed, failed);
            if failed > 0 {
                anyhow::bail!("{} of {} files failed", failed, results.len());
            }
        }
        Commands::Check => {
            Workflow::new(&config).check_availability().await?;
            println!("ffmpeg: {}", config.media.binary_path);
            println!("whisper: {}", config.transcriber.binary_path);
            println!("All external tools are available");
        }
        Commands::InitConfig { output } => {
            config.save_to_file(&output)?;
            println!("Wrote configuration to {}", output.display());
        }
    }

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    let log_dir = std::env::current_dir()?.join(".mediaflow").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "mediaflow.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}
