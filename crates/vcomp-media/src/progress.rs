//! Progress reporting for batch transcodes.
//!
//! Processing code emits plain-data [`ProgressEvent`]s through a
//! [`ProgressSender`]; the presentation layer drains the matching
//! [`ProgressReceiver`] on whatever thread it owns.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use vcomp_models::{JobOutcome, ProgressSample};

use crate::timecode::find_elapsed;

/// Progress event emitted during a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Fraction of the current file encoded, in `[0, 1]`
    Progress { fraction: f64 },

    /// Media seconds left in the current file
    RemainingTime { seconds: f64 },

    /// Base name of the file being encoded
    CurrentFile { name: String },

    /// A candidate file reached its final state
    JobFinished { name: String, outcome: JobOutcome },
}

/// Progress sender, cloneable and non-blocking.
#[derive(Debug, Clone)]
pub struct ProgressSender {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ProgressSender {
    /// Send a progress event. Events are dropped once the receiver is gone.
    pub fn send(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }

    pub fn progress(&self, fraction: f64) {
        self.send(ProgressEvent::Progress { fraction });
    }

    pub fn remaining_time(&self, seconds: f64) {
        self.send(ProgressEvent::RemainingTime { seconds });
    }

    pub fn current_file(&self, name: impl Into<String>) {
        self.send(ProgressEvent::CurrentFile { name: name.into() });
    }

    pub fn job_finished(&self, name: impl Into<String>, outcome: JobOutcome) {
        self.send(ProgressEvent::JobFinished {
            name: name.into(),
            outcome,
        });
    }

    /// Emit one sample as fraction, remaining time and file name, in that order.
    pub fn sample(&self, sample: &ProgressSample) {
        self.progress(sample.fraction);
        self.remaining_time(sample.remaining_secs);
        self.current_file(sample.file_name.clone());
    }
}

/// Progress receiver for collecting events.
#[derive(Debug)]
pub struct ProgressReceiver {
    rx: mpsc::UnboundedReceiver<ProgressEvent>,
}

impl ProgressReceiver {
    /// Receive the next progress event; `None` once every sender is dropped.
    pub async fn recv(&mut self) -> Option<ProgressEvent> {
        self.rx.recv().await
    }

    /// Try to receive a progress event without blocking.
    pub fn try_recv(&mut self) -> Option<ProgressEvent> {
        self.rx.try_recv().ok()
    }

    /// Drain everything currently queued.
    pub fn drain(&mut self) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Create a progress channel pair.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ProgressSender { tx }, ProgressReceiver { rx })
}

/// A no-op progress sender for when progress reporting is not needed.
pub fn noop_sender() -> ProgressSender {
    let (tx, _rx) = mpsc::unbounded_channel();
    ProgressSender { tx }
}

/// Turns diagnostic lines of one job into progress samples.
///
/// Lines without an elapsed marker are ignored, as are markers that go
/// backwards, so emitted fractions never decrease.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_secs: f64,
    file_name: String,
    last_elapsed: Option<f64>,
}

impl ProgressTracker {
    pub fn new(total_secs: f64, file_name: impl Into<String>) -> Self {
        Self {
            total_secs,
            file_name: file_name.into(),
            last_elapsed: None,
        }
    }

    /// Inspect one line; returns a sample when it carries a usable marker.
    pub fn observe(&mut self, line: &str) -> Option<ProgressSample> {
        let elapsed = find_elapsed(line)?;
        if matches!(self.last_elapsed, Some(last) if elapsed < last) {
            return None;
        }
        self.last_elapsed = Some(elapsed);
        Some(ProgressSample::new(elapsed, self.total_secs, self.file_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_progress_channel() {
        let (sender, mut receiver) = channel();

        sender.sample(&ProgressSample::new(10.0, 40.0, "a.mkv"));
        sender.job_finished("a.mkv", JobOutcome::Completed);
        drop(sender);

        assert_eq!(receiver.recv().await, Some(ProgressEvent::Progress { fraction: 0.25 }));
        assert_eq!(
            receiver.recv().await,
            Some(ProgressEvent::RemainingTime { seconds: 30.0 })
        );
        assert_eq!(
            receiver.recv().await,
            Some(ProgressEvent::CurrentFile { name: "a.mkv".to_string() })
        );
        assert!(matches!(
            receiver.recv().await,
            Some(ProgressEvent::JobFinished { outcome: JobOutcome::Completed, .. })
        ));
        assert_eq!(receiver.recv().await, None);
    }

    #[test]
    fn test_noop_sender() {
        let sender = noop_sender();
        // Should not panic even though receiver is dropped
        sender.progress(0.5);
        sender.current_file("a.mkv");
    }

    #[test]
    fn test_tracker_ignores_unmarked_and_backwards_lines() {
        let mut tracker = ProgressTracker::new(100.0, "a.mkv");

        assert!(tracker.observe("Stream mapping:").is_none());
        let first = tracker.observe("frame=1 time=00:00:10.00 bitrate=1k").unwrap();
        assert!((first.fraction - 0.1).abs() < 1e-9);
        assert!(tracker.observe("frame=2 time=00:00:09.50 bitrate=1k").is_none());
        let same = tracker.observe("frame=3 time=00:00:10.00 bitrate=1k").unwrap();
        assert_eq!(same.fraction, first.fraction);
        let over = tracker.observe("frame=4 time=00:01:45.00 bitrate=1k").unwrap();
        assert_eq!(over.fraction, 1.0);
        assert_eq!(over.remaining_secs, 0.0);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&ProgressEvent::Progress { fraction: 0.5 }).unwrap();
        assert_eq!(json, r#"{"type":"progress","fraction":0.5}"#);
    }
}
