//! Media duration probing.

use std::path::Path;
use tracing::debug;

use crate::encoder::Encoder;
use crate::error::{MediaError, MediaResult};
use crate::timecode::find_duration;

/// Get the total duration of `input` in seconds.
///
/// Runs the encoder once in information-only mode and reads the first
/// `Duration:` marker from its diagnostic output. Without a marker there is
/// nothing to measure progress against, so the probe fails with
/// [`MediaError::DurationUnavailable`].
pub async fn probe_duration(encoder: &dyn Encoder, input: &Path) -> MediaResult<f64> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let text = encoder.probe(input).await?;
    let duration =
        find_duration(&text).ok_or_else(|| MediaError::DurationUnavailable(input.to_path_buf()))?;

    debug!(file = %input.display(), duration_secs = duration, "Probed duration");
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Script, ScriptedEncoder};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_probe_duration() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("movie.mkv");
        std::fs::write(&input, b"mkv").unwrap();
        let encoder =
            ScriptedEncoder::new().with_script("movie.mkv", Script::transcode("00:01:30.50", &[]));

        assert_eq!(probe_duration(&encoder, &input).await.unwrap(), 90.5);
        assert_eq!(encoder.probe_count(), 1);
    }

    #[tokio::test]
    async fn test_probe_without_marker() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("still.mkv");
        std::fs::write(&input, b"mkv").unwrap();
        let encoder = ScriptedEncoder::new().with_script("still.mkv", Script::without_duration());

        let err = probe_duration(&encoder, &input).await.unwrap_err();
        assert!(matches!(err, MediaError::DurationUnavailable(ref p) if p == &input));
    }

    #[tokio::test]
    async fn test_probe_missing_file_runs_nothing() {
        let encoder = ScriptedEncoder::new();
        let err = probe_duration(&encoder, Path::new("/nonexistent/movie.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
        assert_eq!(encoder.probe_count(), 0);
    }
}
