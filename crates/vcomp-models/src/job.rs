//! Transcode jobs, their lifecycle and reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::encoding::VideoCodec;

/// Unique identifier for a job, used to correlate log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One input-to-output transcode. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub id: JobId,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Target video bitrate, passed to the encoder unchanged
    pub bitrate: String,
    pub codec: VideoCodec,
}

impl TranscodeJob {
    pub fn new(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        bitrate: impl Into<String>,
        codec: VideoCodec,
    ) -> Self {
        Self {
            id: JobId::new(),
            input: input.into(),
            output: output.into(),
            bitrate: bitrate.into(),
            codec,
        }
    }

    /// Base file name of the input, as shown to the user.
    pub fn file_name(&self) -> String {
        display_name(&self.input)
    }
}

/// Base file name of a path, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Per-job state machine.
///
/// `Probing -> Running -> {Completed | Cancelled | Failed}`; probing may also
/// fail directly. Terminal states have no outgoing edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Reading the media duration
    #[default]
    Probing,
    /// Encoder child process is running
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Probing => "probing",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::Failed
        )
    }

    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (JobState::Probing, JobState::Running)
                | (JobState::Probing, JobState::Failed)
                | (JobState::Running, JobState::Completed)
                | (JobState::Running, JobState::Cancelled)
                | (JobState::Running, JobState::Failed)
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final result of one candidate file in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobOutcome {
    /// Encoder finished the whole file
    Completed,
    /// Output already present, nothing was run
    Skipped,
    /// Stopped on request
    Cancelled,
    /// Probe, spawn or encode failed
    Failed { error: String },
}

impl JobOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        JobOutcome::Failed {
            error: error.into(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Completed => "completed",
            JobOutcome::Skipped => "skipped",
            JobOutcome::Cancelled => "cancelled",
            JobOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, JobOutcome::Cancelled)
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Failed { error } => write!(f, "failed: {}", error),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Outcome of one file together with the time spent on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobReport {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub outcome: JobOutcome,
    /// Wall-clock seconds from probe start to terminal state
    pub elapsed_secs: f64,
}

impl JobReport {
    pub fn skipped(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: None,
            outcome: JobOutcome::Skipped,
            elapsed_secs: 0.0,
        }
    }
}

/// Summary of a whole batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub jobs: Vec<JobReport>,
    /// The batch stopped early on request
    pub cancelled: bool,
    /// The post-task command was issued
    pub post_task_executed: bool,
}

impl BatchReport {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            jobs: Vec::new(),
            cancelled: false,
            post_task_executed: false,
        }
    }

    pub fn push(&mut self, report: JobReport) {
        self.jobs.push(report);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    fn count(&self, pred: impl Fn(&JobOutcome) -> bool) -> usize {
        self.jobs.iter().filter(|j| pred(&j.outcome)).count()
    }

    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Completed))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Skipped))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, JobOutcome::Failed { .. }))
    }

    /// Number of files handed to the supervisor (everything except skips).
    pub fn attempted(&self) -> usize {
        self.jobs.len() - self.skipped()
    }
}

impl Default for BatchReport {
    fn default() -> Self {
        Self::new()
    }
}
