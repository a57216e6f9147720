//! Sequential batch execution over an input directory tree.

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn, Instrument};

use vcomp_media::{CancellationToken, Encoder, ProgressSender, TranscodeSupervisor};
use vcomp_models::{display_name, BatchConfig, BatchReport, JobOutcome, JobReport, TranscodeJob};

use crate::discovery::{find_sources, output_has_stem};
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::post_task::PostTaskRunner;

/// Runs every source file of a batch through the supervisor, one at a time.
#[derive(Clone)]
pub struct BatchRunner {
    supervisor: TranscodeSupervisor,
    post_task: Arc<dyn PostTaskRunner>,
}

impl BatchRunner {
    pub fn new(encoder: Arc<dyn Encoder>, post_task: Arc<dyn PostTaskRunner>) -> Self {
        Self {
            supervisor: TranscodeSupervisor::new(encoder),
            post_task,
        }
    }

    /// Run the batch described by `config`.
    ///
    /// Only an invalid configuration or an output directory that cannot be
    /// created fails the whole batch; per-file problems end up in the report.
    /// Once `cancel` is set no further file starts and the post-task is not run.
    pub async fn run(
        &self,
        config: &BatchConfig,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> WorkerResult<BatchReport> {
        config.validate().map_err(WorkerError::config_error)?;
        if !config.input_dir.is_dir() {
            return Err(WorkerError::config_error(format!(
                "input directory not found: {}",
                config.input_dir.display()
            )));
        }
        tokio::fs::create_dir_all(&config.output_dir).await?;

        let started = Instant::now();
        let sources = find_sources(&config.input_dir);
        let codec = config.codec();
        info!(
            input_dir = %config.input_dir.display(),
            output_dir = %config.output_dir.display(),
            sources = sources.len(),
            codec = %codec,
            bitrate = %config.bitrate,
            "Starting batch of {} file(s)", sources.len()
        );

        let mut report = BatchReport::new();
        for source in sources {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let name = display_name(&source);
            let Some(output) = config.output_path_for(&source) else {
                warn!(file = %name, "Source has no file stem, ignoring");
                continue;
            };
            let stem = source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();

            match output_has_stem(&config.output_dir, &stem) {
                Ok(false) => {}
                Ok(true) => {
                    info!(file = %name, "Skipping {}: output already exists", name);
                    metrics::counter!("vcomp_jobs_total", "outcome" => JobOutcome::Skipped.as_str())
                        .increment(1);
                    progress.job_finished(name, JobOutcome::Skipped);
                    report.push(JobReport::skipped(source));
                    continue;
                }
                Err(e) => {
                    error!(
                        file = %name,
                        output_dir = %config.output_dir.display(),
                        "Failed to check for existing output: {}", e
                    );
                    metrics::counter!("vcomp_jobs_total", "outcome" => "failed").increment(1);
                    let outcome = JobOutcome::failed(format!(
                        "Failed to list {}: {}",
                        config.output_dir.display(),
                        e
                    ));
                    progress.job_finished(name, outcome.clone());
                    report.push(JobReport {
                        input: source,
                        output: Some(output),
                        outcome,
                        elapsed_secs: 0.0,
                    });
                    continue;
                }
            }

            let job = TranscodeJob::new(source, output, config.bitrate.clone(), codec);
            let logger = JobLogger::for_job(&job);
            logger.log_start(&job);
            let job_report = self
                .supervisor
                .run(&job, progress, cancel)
                .instrument(logger.create_span())
                .await;

            progress.job_finished(name, job_report.outcome.clone());
            let stopped = job_report.outcome.is_cancelled() || cancel.is_cancelled();
            report.push(job_report);
            if stopped {
                report.cancelled = true;
                break;
            }
        }

        if report.cancelled {
            info!("Batch cancelled, post-task not run");
        } else if !config.post_task.is_noop() {
            match self.post_task.execute(config.post_task) {
                Ok(()) => report.post_task_executed = true,
                Err(e) => error!(post_task = %config.post_task, "Post-task failed: {}", e),
            }
        }

        report.finish();
        info!(
            completed = report.completed(),
            skipped = report.skipped(),
            failed = report.failed(),
            cancelled = report.cancelled,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "Batch finished"
        );
        Ok(report)
    }
}
