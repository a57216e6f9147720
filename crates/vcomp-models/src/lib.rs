//! Shared data models for the vcomp batch compressor.
//!
//! This crate provides Serde-serializable types for:
//! - Batch configuration and post-batch actions
//! - Transcode jobs, their states and outcomes
//! - Encoding parameters (codec selection, fixed output scale)
//! - Progress samples and timecode helpers

pub mod batch;
pub mod encoding;
pub mod job;
pub mod progress;
pub mod timestamp;

// Re-export common types
pub use batch::{BatchConfig, PostTask, PostTaskParseError};
pub use encoding::{VideoCodec, OUTPUT_HEIGHT, OUTPUT_WIDTH};
pub use job::{display_name, BatchReport, JobId, JobOutcome, JobReport, JobState, TranscodeJob};
pub use progress::ProgressSample;
pub use timestamp::{format_hms, parse_timecode, TimestampError};
