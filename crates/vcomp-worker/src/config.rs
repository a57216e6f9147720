//! Worker configuration.

use std::path::{Path, PathBuf};

use vcomp_media::{FfmpegEncoder, MediaResult};
use vcomp_models::batch::DEFAULT_OUTPUT_EXTENSION;
use vcomp_models::encoding::DEFAULT_BITRATE;
use vcomp_models::{BatchConfig, PostTask};

/// Worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerConfig {
    /// Explicit FFmpeg binary; looked up on `PATH` when unset
    pub ffmpeg_path: Option<PathBuf>,
    /// Target video bitrate, e.g. "2M"
    pub bitrate: String,
    /// Container extension of compressed files
    pub output_extension: String,
    /// Action after a batch that was not cancelled
    pub post_task: PostTask,
    /// Use the NVENC hardware encoder
    pub hardware_accel: bool,
    /// Log the post-task command instead of running it
    pub post_task_dry_run: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            bitrate: DEFAULT_BITRATE.to_string(),
            output_extension: DEFAULT_OUTPUT_EXTENSION.to_string(),
            post_task: PostTask::None,
            hardware_accel: true,
            post_task_dry_run: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            ffmpeg_path: lookup("VCOMP_FFMPEG_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            bitrate: lookup("VCOMP_BITRATE")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.bitrate),
            output_extension: lookup("VCOMP_OUTPUT_EXTENSION")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.output_extension),
            post_task: lookup("VCOMP_POST_TASK")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.post_task),
            hardware_accel: lookup("VCOMP_HWACCEL")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.hardware_accel),
            post_task_dry_run: lookup("VCOMP_POST_TASK_DRY_RUN")
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.post_task_dry_run),
        }
    }

    /// Batch configuration for one input/output directory pair.
    pub fn batch_config(&self, input_dir: &Path, output_dir: &Path) -> BatchConfig {
        BatchConfig::new(input_dir, output_dir)
            .with_bitrate(self.bitrate.clone())
            .with_output_extension(&self.output_extension)
            .with_post_task(self.post_task)
            .with_hardware_accel(self.hardware_accel)
    }

    /// Encoder for the configured binary.
    pub fn encoder(&self) -> MediaResult<FfmpegEncoder> {
        match &self.ffmpeg_path {
            Some(path) => Ok(FfmpegEncoder::with_binary(path)),
            None => FfmpegEncoder::from_path(),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
