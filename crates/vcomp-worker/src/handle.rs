//! Background execution of a batch.
//!
//! The batch runs on its own tokio task while the caller keeps the
//! cancellation token and the progress receiver.

use std::sync::Arc;
use tokio::task::JoinHandle;

use vcomp_media::{progress_channel, CancellationToken, ProgressReceiver};
use vcomp_models::{BatchConfig, BatchReport};

use crate::batch::BatchRunner;
use crate::error::{WorkerError, WorkerResult};

/// Controller side of a running batch.
pub struct BatchHandle {
    cancel: CancellationToken,
    events: ProgressReceiver,
    task: JoinHandle<WorkerResult<BatchReport>>,
}

/// Start `config` on a background task.
pub fn spawn_batch(runner: Arc<BatchRunner>, config: BatchConfig) -> BatchHandle {
    let cancel = CancellationToken::new();
    let (progress, events) = progress_channel();

    let task = {
        let cancel = cancel.clone();
        tokio::spawn(async move { runner.run(&config, &progress, &cancel).await })
    };

    BatchHandle {
        cancel,
        events,
        task,
    }
}

impl BatchHandle {
    /// Request cancellation. Safe to call any number of times.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Progress events; the stream ends once the batch task is done.
    pub fn events(&mut self) -> &mut ProgressReceiver {
        &mut self.events
    }

    /// Wait for the batch to finish. After cancellation this includes the
    /// wait for the running encoder to exit.
    pub async fn join(self) -> WorkerResult<BatchReport> {
        self.task
            .await
            .map_err(|e| WorkerError::internal(format!("Batch task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post_task::MockPostTaskRunner;
    use std::fs;
    use tempfile::TempDir;
    use vcomp_media::testing::{Script, ScriptedEncoder};
    use vcomp_media::ProgressEvent;
    use vcomp_models::JobOutcome;

    fn runner(encoder: ScriptedEncoder) -> Arc<BatchRunner> {
        let mut post_task = MockPostTaskRunner::new();
        post_task.expect_execute().never();
        Arc::new(BatchRunner::new(Arc::new(encoder), Arc::new(post_task)))
    }

    #[tokio::test]
    async fn test_events_end_when_batch_finishes() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        fs::create_dir_all(&input).unwrap();
        fs::write(input.join("a.mkv"), b"x").unwrap();
        let encoder = ScriptedEncoder::new()
            .with_script("a.mkv", Script::transcode("00:00:04.00", &["00:00:02.00", "00:00:04.00"]));

        let mut handle = spawn_batch(runner(encoder), BatchConfig::new(&input, dir.path().join("out")));
        let mut events = Vec::new();
        while let Some(event) = handle.events().recv().await {
            events.push(event);
        }
        let report = handle.join().await.unwrap();

        assert_eq!(report.completed(), 1);
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::JobFinished { outcome: JobOutcome::Completed, .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_from_controller() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in");
        fs::create_dir_all(&input).unwrap();
        for name in ["a.mkv", "b.mkv"] {
            fs::write(input.join(name), b"x").unwrap();
        }
        let script = Script::transcode("00:00:04.00", &["00:00:01.00", "00:00:02.00"]);
        let encoder = ScriptedEncoder::new()
            .with_script("a.mkv", script.clone())
            .with_script("b.mkv", script);

        let mut handle = spawn_batch(
            runner(encoder.clone()),
            BatchConfig::new(&input, dir.path().join("out")),
        );
        handle.cancel();
        handle.cancel();
        while handle.events().recv().await.is_some() {}
        let report = handle.join().await.unwrap();

        assert!(report.cancelled);
        assert!(report.attempted() <= 1);
    }
}
