//! Supervised transcoding of a single job.
//!
//! The supervisor probes the input, launches the encoder, turns its
//! diagnostic stream into progress samples and honours cancellation. Each
//! call reports exactly one terminal outcome.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use vcomp_models::{JobOutcome, JobReport, JobState, TranscodeJob};

use crate::cancel::CancellationToken;
use crate::command::TranscodeCommand;
use crate::encoder::{Encoder, EncoderProcess};
use crate::error::MediaResult;
use crate::probe::probe_duration;
use crate::progress::{ProgressSender, ProgressTracker};

/// Runs one transcode job at a time against an [`Encoder`].
#[derive(Clone)]
pub struct TranscodeSupervisor {
    encoder: Arc<dyn Encoder>,
}

impl TranscodeSupervisor {
    pub fn new(encoder: Arc<dyn Encoder>) -> Self {
        Self { encoder }
    }

    /// Run `job` to a terminal outcome.
    ///
    /// Failures are folded into [`JobOutcome::Failed`]; nothing here is fatal
    /// to the caller.
    pub async fn run(
        &self,
        job: &TranscodeJob,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> JobReport {
        let started = Instant::now();
        let file_name = job.file_name();
        let mut state = JobState::Probing;

        let outcome = match self.supervise(job, &file_name, &mut state, progress, cancel).await {
            Ok(outcome) => outcome,
            Err(e) => {
                advance(&mut state, JobState::Failed, &file_name);
                metrics::counter!("vcomp_job_errors_total", "kind" => e.kind()).increment(1);
                JobOutcome::failed(e.to_string())
            }
        };
        let elapsed = started.elapsed().as_secs_f64();

        match &outcome {
            JobOutcome::Completed => info!(
                job_id = %job.id,
                file = %file_name,
                elapsed_secs = elapsed,
                "Compression finished in {:.2}s", elapsed
            ),
            JobOutcome::Cancelled => info!(
                job_id = %job.id,
                file = %file_name,
                elapsed_secs = elapsed,
                "Compression cancelled after {:.2}s", elapsed
            ),
            JobOutcome::Failed { error } => error!(
                job_id = %job.id,
                file = %file_name,
                elapsed_secs = elapsed,
                "Compression failed after {:.2}s: {}", elapsed, error
            ),
            JobOutcome::Skipped => {}
        }
        metrics::counter!("vcomp_jobs_total", "outcome" => outcome.as_str()).increment(1);
        metrics::histogram!("vcomp_job_duration_seconds").record(elapsed);

        JobReport {
            input: job.input.clone(),
            output: Some(job.output.clone()),
            outcome,
            elapsed_secs: elapsed,
        }
    }

    async fn supervise(
        &self,
        job: &TranscodeJob,
        file_name: &str,
        state: &mut JobState,
        progress: &ProgressSender,
        cancel: &CancellationToken,
    ) -> MediaResult<JobOutcome> {
        let total = probe_duration(self.encoder.as_ref(), &job.input).await?;

        let command = TranscodeCommand::from_job(job);
        let mut process = self.encoder.spawn(&command).await?;
        advance(state, JobState::Running, file_name);
        info!(
            job_id = %job.id,
            file = %file_name,
            codec = %job.codec,
            hardware = job.codec.is_hardware(),
            bitrate = %job.bitrate,
            duration_secs = total,
            "Compressing {}", file_name
        );

        let mut tracker = ProgressTracker::new(total, file_name);
        loop {
            if cancel.is_cancelled() {
                return stop(process.as_mut(), state, file_name).await;
            }

            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => continue,
                line = process.next_line() => line,
            };

            match next {
                Ok(Some(line)) => {
                    // A line read while the token flipped is dropped unprocessed
                    if cancel.is_cancelled() {
                        return stop(process.as_mut(), state, file_name).await;
                    }
                    if let Some(sample) = tracker.observe(&line) {
                        progress.sample(&sample);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    if let Err(stop_err) = process.terminate().await {
                        warn!(file = %file_name, "Failed to stop encoder after read error: {}", stop_err);
                    }
                    return Err(e);
                }
            }
        }

        if cancel.is_cancelled() {
            return stop(process.as_mut(), state, file_name).await;
        }

        process.wait().await?;
        advance(state, JobState::Completed, file_name);
        Ok(JobOutcome::Completed)
    }
}

async fn stop(
    process: &mut dyn EncoderProcess,
    state: &mut JobState,
    file_name: &str,
) -> MediaResult<JobOutcome> {
    info!(file = %file_name, "Cancellation requested, stopping encoder");
    process.terminate().await?;
    advance(state, JobState::Cancelled, file_name);
    Ok(JobOutcome::Cancelled)
}

fn advance(state: &mut JobState, next: JobState, file_name: &str) {
    debug_assert!(
        state.can_transition_to(next),
        "illegal job transition {} -> {}",
        state,
        next
    );
    debug!(file = %file_name, from = %state, to = %next, "Job state change");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{channel, ProgressEvent};
    use crate::testing::{Script, ScriptedEncoder};
    use tempfile::TempDir;
    use vcomp_models::VideoCodec;

    fn job_in(dir: &TempDir, name: &str) -> TranscodeJob {
        let input = dir.path().join(name);
        std::fs::write(&input, b"mkv").unwrap();
        TranscodeJob::new(input, dir.path().join("out.mp4"), "2M", VideoCodec::X264)
    }

    fn fractions(events: &[ProgressEvent]) -> Vec<f64> {
        events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { fraction } => Some(*fraction),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_completed_job_reports_progress() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir, "movie.mkv");
        let encoder = ScriptedEncoder::new().with_script(
            "movie.mkv",
            Script::transcode("00:01:40.00", &["00:00:25.00", "00:00:50.00", "00:01:40.00"]),
        );
        let supervisor = TranscodeSupervisor::new(Arc::new(encoder.clone()));
        let (tx, mut rx) = channel();

        let report = supervisor.run(&job, &tx, &CancellationToken::new()).await;

        assert_eq!(report.outcome, JobOutcome::Completed);
        assert_eq!(encoder.spawn_count(), 1);
        let events = rx.drain();
        assert_eq!(fractions(&events), vec![0.25, 0.5, 1.0]);
        assert_eq!(
            events[1],
            ProgressEvent::RemainingTime { seconds: 75.0 }
        );
        assert_eq!(
            events[2],
            ProgressEvent::CurrentFile { name: "movie.mkv".to_string() }
        );
    }

    #[tokio::test]
    async fn test_fraction_is_monotonic_and_bounded() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir, "movie.mkv");
        let encoder = ScriptedEncoder::new().with_script(
            "movie.mkv",
            Script::transcode(
                "00:00:10.00",
                &["00:00:02.00", "00:00:01.00", "00:00:04.00", "00:00:04.00", "00:00:12.00"],
            ),
        );
        let supervisor = TranscodeSupervisor::new(Arc::new(encoder));
        let (tx, mut rx) = channel();

        supervisor.run(&job, &tx, &CancellationToken::new()).await;

        let seen = fractions(&rx.drain());
        assert_eq!(seen, vec![0.2, 0.4, 0.4, 1.0]);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!(seen.iter().all(|f| (0.0..=1.0).contains(f)));
    }

    #[tokio::test]
    async fn test_missing_duration_never_spawns() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir, "broken.mkv");
        let encoder = ScriptedEncoder::new().with_script("broken.mkv", Script::without_duration());
        let supervisor = TranscodeSupervisor::new(Arc::new(encoder.clone()));
        let (tx, mut rx) = channel();

        let report = supervisor.run(&job, &tx, &CancellationToken::new()).await;

        assert!(matches!(report.outcome, JobOutcome::Failed { ref error } if error.contains("No duration")));
        assert_eq!(encoder.probe_count(), 1);
        assert_eq!(encoder.spawn_count(), 0);
        assert!(rx.drain().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_stops_within_one_line() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir, "movie.mkv");
        let cancel = CancellationToken::new();
        let encoder = ScriptedEncoder::new().with_script(
            "movie.mkv",
            Script::transcode(
                "00:01:40.00",
                &["00:00:10.00", "00:00:20.00", "00:00:30.00", "00:00:40.00"],
            )
            .cancel_after(2, cancel.clone()),
        );
        let supervisor = TranscodeSupervisor::new(Arc::new(encoder.clone()));
        let (tx, mut rx) = channel();

        let report = supervisor.run(&job, &tx, &cancel).await;

        assert_eq!(report.outcome, JobOutcome::Cancelled);
        assert_eq!(encoder.terminate_count(), 1);
        // The line that arrived with the token set is not reported
        assert_eq!(fractions(&rx.drain()), vec![0.1]);
    }

    #[tokio::test]
    async fn test_no_callbacks_after_cancel_on_first_line() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir, "movie.mkv");
        let cancel = CancellationToken::new();
        let encoder = ScriptedEncoder::new().with_script(
            "movie.mkv",
            Script::transcode("00:01:40.00", &["00:00:10.00", "00:00:20.00"])
                .cancel_after(1, cancel.clone()),
        );
        let supervisor = TranscodeSupervisor::new(Arc::new(encoder.clone()));
        let (tx, mut rx) = channel();

        let report = supervisor.run(&job, &tx, &cancel).await;

        assert_eq!(report.outcome, JobOutcome::Cancelled);
        assert_eq!(encoder.terminate_count(), 1);
        assert!(rx.drain().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_is_failed_outcome() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir, "movie.mkv");
        let encoder = ScriptedEncoder::new()
            .with_script("movie.mkv", Script::transcode("00:00:10.00", &[]).failing_spawn());
        let supervisor = TranscodeSupervisor::new(Arc::new(encoder));

        let report = supervisor.run(&job, &noop(), &CancellationToken::new()).await;

        assert!(matches!(report.outcome, JobOutcome::Failed { ref error } if error.starts_with("Failed to start")));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failed_outcome() {
        let dir = TempDir::new().unwrap();
        let job = job_in(&dir, "movie.mkv");
        let encoder = ScriptedEncoder::new().with_script(
            "movie.mkv",
            Script::transcode("00:00:10.00", &["00:00:05.00"]).exit_failure(),
        );
        let supervisor = TranscodeSupervisor::new(Arc::new(encoder));

        let report = supervisor.run(&job, &noop(), &CancellationToken::new()).await;

        assert!(matches!(report.outcome, JobOutcome::Failed { .. }));
    }

    fn noop() -> ProgressSender {
        crate::progress::noop_sender()
    }
}
