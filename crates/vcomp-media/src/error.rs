//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while probing or transcoding.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("Failed to start {binary}: {source}")]
    SpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No duration found for {0}")]
    DurationUnavailable(PathBuf),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        exit_code: Option<i32>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a spawn failure error.
    pub fn spawn_failed(binary: impl Into<String>, source: std::io::Error) -> Self {
        Self::SpawnFailed {
            binary: binary.into(),
            source,
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Short label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            MediaError::FfmpegNotFound => "ffmpeg_not_found",
            MediaError::SpawnFailed { .. } => "spawn_failed",
            MediaError::DurationUnavailable(_) => "duration_unavailable",
            MediaError::FfmpegFailed { .. } => "ffmpeg_failed",
            MediaError::FileNotFound(_) => "file_not_found",
            MediaError::Io(_) => "io",
            MediaError::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = MediaError::DurationUnavailable(PathBuf::from("a.mkv"));
        assert_eq!(err.to_string(), "No duration found for a.mkv");
        assert_eq!(err.kind(), "duration_unavailable");

        let err = MediaError::spawn_failed(
            "ffmpeg",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "Failed to start ffmpeg: missing");
        assert_eq!(err.kind(), "spawn_failed");
    }
}
