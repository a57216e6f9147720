//! Video encoding parameters.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hardware-accelerated H.264 encoder (NVENC).
pub const HARDWARE_VIDEO_CODEC: &str = "h264_nvenc";
/// Software H.264 encoder.
pub const SOFTWARE_VIDEO_CODEC: &str = "libx264";
/// Audio streams are always copied, never re-encoded.
pub const AUDIO_PASSTHROUGH: &str = "copy";

/// Fixed output resolution.
pub const OUTPUT_WIDTH: u32 = 1440;
pub const OUTPUT_HEIGHT: u32 = 1080;

/// Default target video bitrate, passed to the encoder verbatim.
pub const DEFAULT_BITRATE: &str = "2M";

/// Video codec selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VideoCodec {
    /// NVIDIA hardware encoder
    #[default]
    Nvenc,
    /// libx264 software encoder
    X264,
}

impl VideoCodec {
    /// Pick the codec for the hardware-acceleration flag.
    pub fn select(hardware_accel: bool) -> Self {
        if hardware_accel {
            VideoCodec::Nvenc
        } else {
            VideoCodec::X264
        }
    }

    /// Encoder name as understood by FFmpeg's `-c:v`.
    pub fn as_ffmpeg_codec(&self) -> &'static str {
        match self {
            VideoCodec::Nvenc => HARDWARE_VIDEO_CODEC,
            VideoCodec::X264 => SOFTWARE_VIDEO_CODEC,
        }
    }

    pub fn is_hardware(&self) -> bool {
        matches!(self, VideoCodec::Nvenc)
    }
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ffmpeg_codec())
    }
}

/// Scale filter for the fixed output resolution.
pub fn scale_filter() -> String {
    format!("scale={}:{}", OUTPUT_WIDTH, OUTPUT_HEIGHT)
}
