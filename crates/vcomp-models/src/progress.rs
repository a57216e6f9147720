//! Progress samples derived from encoder output.

use serde::{Deserialize, Serialize};

/// One progress observation for the running job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    /// Position reported by the encoder, in seconds
    pub elapsed_secs: f64,
    /// `elapsed / total`, clamped to `[0, 1]`
    pub fraction: f64,
    /// `total - elapsed`, never negative
    pub remaining_secs: f64,
    /// Base name of the file being encoded
    pub file_name: String,
}

impl ProgressSample {
    /// Build a sample from an elapsed position and the probed total duration.
    ///
    /// A non-positive total yields a fraction of 0.
    pub fn new(elapsed_secs: f64, total_secs: f64, file_name: impl Into<String>) -> Self {
        let fraction = if total_secs > 0.0 {
            (elapsed_secs / total_secs).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let remaining_secs = (total_secs - elapsed_secs).max(0.0);

        Self {
            elapsed_secs,
            fraction,
            remaining_secs,
            file_name: file_name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_midway() {
        let sample = ProgressSample::new(30.0, 120.0, "a.mkv");
        assert!((sample.fraction - 0.25).abs() < 1e-9);
        assert!((sample.remaining_secs - 90.0).abs() < 1e-9);
        assert_eq!(sample.file_name, "a.mkv");
    }

    #[test]
    fn test_sample_clamps_overshoot() {
        let sample = ProgressSample::new(125.0, 120.0, "a.mkv");
        assert_eq!(sample.fraction, 1.0);
        assert_eq!(sample.remaining_secs, 0.0);
    }

    #[test]
    fn test_sample_zero_duration() {
        let sample = ProgressSample::new(3.0, 0.0, "a.mkv");
        assert_eq!(sample.fraction, 0.0);
        assert_eq!(sample.remaining_secs, 0.0);
    }
}
