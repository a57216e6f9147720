#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for batch compression.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - Duration probing from FFmpeg's input summary
//! - Progress scraping from FFmpeg's stats lines
//! - A supervisor that runs one transcode with cooperative cancellation
//! - An [`Encoder`] seam so the external tool can be swapped or scripted

pub mod cancel;
pub mod command;
pub mod encoder;
pub mod error;
pub mod probe;
pub mod progress;
pub mod supervisor;
pub mod timecode;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cancel::CancellationToken;
pub use command::TranscodeCommand;
pub use encoder::{DiagnosticLines, Encoder, EncoderProcess, FfmpegEncoder};
pub use error::{MediaError, MediaResult};
pub use probe::probe_duration;
pub use progress::{
    channel as progress_channel, noop_sender, ProgressEvent, ProgressReceiver, ProgressSender,
    ProgressTracker,
};
pub use supervisor::TranscodeSupervisor;
