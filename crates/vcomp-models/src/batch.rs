//! Batch configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::encoding::{VideoCodec, DEFAULT_BITRATE};

/// Extension of the files picked up from the input tree (compared case-insensitively).
pub const SOURCE_EXTENSION: &str = "mkv";

/// Default container for compressed output.
pub const DEFAULT_OUTPUT_EXTENSION: &str = ".mp4";

/// Action performed after a batch finishes without cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostTask {
    /// Do nothing
    #[default]
    None,
    /// Power the machine off
    Shutdown,
    /// Hibernate the machine
    Hibernate,
}

impl PostTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostTask::None => "none",
            PostTask::Shutdown => "shutdown",
            PostTask::Hibernate => "hibernate",
        }
    }

    /// Whether this task has an external side effect.
    pub fn is_noop(&self) -> bool {
        matches!(self, PostTask::None)
    }
}

impl fmt::Display for PostTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognised post-task name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown post-task '{0}' (expected none, shutdown or hibernate)")]
pub struct PostTaskParseError(pub String);

impl FromStr for PostTask {
    type Err = PostTaskParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(PostTask::None),
            "shutdown" => Ok(PostTask::Shutdown),
            "hibernate" => Ok(PostTask::Hibernate),
            other => Err(PostTaskParseError(other.to_string())),
        }
    }
}

/// Configuration for one batch run. Read-only once the batch starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Directory scanned recursively for source files
    pub input_dir: PathBuf,
    /// Directory receiving compressed files (created if missing)
    pub output_dir: PathBuf,
    /// Target video bitrate, passed through unchanged (e.g. "2M")
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
    /// Output extension including the leading dot
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
    /// Action after a completed, non-cancelled batch
    #[serde(default)]
    pub post_task: PostTask,
    /// Use the hardware encoder
    #[serde(default = "default_hardware_accel")]
    pub hardware_accel: bool,
}

fn default_bitrate() -> String {
    DEFAULT_BITRATE.to_string()
}
fn default_output_extension() -> String {
    DEFAULT_OUTPUT_EXTENSION.to_string()
}
fn default_hardware_accel() -> bool {
    true
}

impl BatchConfig {
    /// Create a configuration with default encoding settings.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            bitrate: default_bitrate(),
            output_extension: default_output_extension(),
            post_task: PostTask::None,
            hardware_accel: default_hardware_accel(),
        }
    }

    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    /// Set the output extension; a missing leading dot is added.
    pub fn with_output_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.output_extension = normalize_extension(extension.as_ref());
        self
    }

    pub fn with_post_task(mut self, post_task: PostTask) -> Self {
        self.post_task = post_task;
        self
    }

    pub fn with_hardware_accel(mut self, enabled: bool) -> Self {
        self.hardware_accel = enabled;
        self
    }

    /// Codec implied by the hardware-acceleration flag.
    pub fn codec(&self) -> VideoCodec {
        VideoCodec::select(self.hardware_accel)
    }

    /// Output path for a source file: `<output_dir>/<stem><extension>`.
    ///
    /// Returns `None` when the source has no file stem.
    pub fn output_path_for(&self, source: &Path) -> Option<PathBuf> {
        let stem = source.file_stem()?.to_string_lossy();
        let extension = normalize_extension(&self.output_extension);
        Some(self.output_dir.join(format!("{}{}", stem, extension)))
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.input_dir.as_os_str().is_empty() {
            return Err("input directory must be set".to_string());
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err("output directory must be set".to_string());
        }
        if self.bitrate.trim().is_empty() {
            return Err("bitrate must not be empty".to_string());
        }
        let extension = normalize_extension(&self.output_extension);
        if extension.len() < 2 {
            return Err("output extension must not be empty".to_string());
        }
        if extension.contains(['/', '\\']) {
            return Err(format!("invalid output extension: {}", self.output_extension));
        }
        Ok(())
    }
}

/// Ensure an extension starts with a single dot.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    format!(".{}", trimmed)
}

/// Whether a path carries the source extension (case-insensitive).
pub fn is_source_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(SOURCE_EXTENSION))
        .unwrap_or(false)
}
