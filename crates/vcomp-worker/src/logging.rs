//! Structured job logging utilities.
//!
//! Provides consistent, structured logging for the files of a batch with
//! tracing spans and contextual information.

use tracing::{info, Span};
use vcomp_models::{JobId, TranscodeJob};

/// Job logger for structured logging with consistent formatting.
///
/// Every message carries the job ID and the base name of the input file.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    file: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, file: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            file: file.to_string(),
        }
    }

    /// Logger for a transcode job.
    pub fn for_job(job: &TranscodeJob) -> Self {
        Self::new(&job.id, &job.file_name())
    }

    /// Log the start of a transcode.
    pub fn log_start(&self, job: &TranscodeJob) {
        info!(
            job_id = %self.job_id,
            file = %self.file,
            output = %job.output.display(),
            "Job started: {} -> {}", self.file, job.output.display()
        );
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Create a tracing span for this job.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            file = %self.file
        )
    }
}
