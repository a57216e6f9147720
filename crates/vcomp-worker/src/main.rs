//! Batch video compressor binary.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vcomp_models::PostTask;
use vcomp_worker::{
    spawn_batch, BatchRunner, ConsoleProgress, PostTaskRunner, SystemPostTask, WorkerConfig,
};

/// Compress every .mkv file under INPUT_DIR into OUTPUT_DIR.
#[derive(Parser, Debug)]
#[command(name = "vcomp", author, version, about, long_about = None)]
struct Args {
    /// Directory scanned recursively for .mkv files
    input_dir: PathBuf,

    /// Directory receiving compressed files (created if missing)
    output_dir: PathBuf,

    /// Target video bitrate, passed to FFmpeg unchanged
    #[arg(short, long)]
    bitrate: Option<String>,

    /// Output container extension
    #[arg(short, long)]
    extension: Option<String>,

    /// Action after the batch: none, shutdown or hibernate
    #[arg(long)]
    post_task: Option<PostTask>,

    /// Use libx264 instead of the NVENC hardware encoder
    #[arg(long)]
    software: bool,

    /// FFmpeg binary to use instead of the one on PATH
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Log the post-task command instead of running it
    #[arg(long)]
    dry_run_post_task: bool,

    /// Write a JSON report of the batch to this file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Command-line values take precedence over the environment.
    fn apply(&self, config: &mut WorkerConfig) {
        if let Some(bitrate) = &self.bitrate {
            config.bitrate = bitrate.clone();
        }
        if let Some(extension) = &self.extension {
            config.output_extension = extension.clone();
        }
        if let Some(post_task) = self.post_task {
            config.post_task = post_task;
        }
        if self.software {
            config.hardware_accel = false;
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.ffmpeg_path = Some(ffmpeg.clone());
        }
        if self.dry_run_post_task {
            config.post_task_dry_run = true;
        }
    }
}

fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    // Colored output for terminals, JSON for log collectors
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let level = if verbose { "vcomp=debug" } else { "vcomp=info" };
    let env_filter = EnvFilter::from_default_env().add_directive(level.parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut config = WorkerConfig::from_env();
    args.apply(&mut config);
    info!("Worker config: {:?}", config);

    let encoder = config.encoder().context("Failed to locate FFmpeg")?;
    let post_task: Arc<dyn PostTaskRunner> = if config.post_task_dry_run {
        Arc::new(SystemPostTask::dry_run())
    } else {
        Arc::new(SystemPostTask::new())
    };
    let runner = Arc::new(BatchRunner::new(Arc::new(encoder), post_task));
    let batch = config.batch_config(&args.input_dir, &args.output_dir);

    let mut handle = spawn_batch(runner, batch);
    let mut console = ConsoleProgress::new();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut cancelling = false;
    loop {
        tokio::select! {
            event = handle.events().recv() => match event {
                Some(event) => console.handle(&event),
                None => break,
            },
            _ = &mut ctrl_c, if !cancelling => {
                cancelling = true;
                warn!("Received Ctrl-C, cancelling batch");
                handle.cancel();
            }
        }
    }
    console.finish();

    let report = handle.join().await?;
    if let Some(path) = &args.report {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!("Report written to {}", path.display());
    }

    info!(
        "Batch {}: {} completed, {} skipped, {} failed",
        if report.cancelled { "cancelled" } else { "finished" },
        report.completed(),
        report.skipped(),
        report.failed()
    );
    Ok(())
}
