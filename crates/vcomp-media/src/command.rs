//! FFmpeg command builder.

use std::path::{Path, PathBuf};

use vcomp_models::encoding::{scale_filter, AUDIO_PASSTHROUGH};
use vcomp_models::TranscodeJob;

/// Builder for FFmpeg transcode commands.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after -i)
    output_args: Vec<String>,
}

impl TranscodeCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
        }
    }

    /// Command for a batch job: target bitrate, selected codec, audio copied,
    /// fixed output scale.
    pub fn from_job(job: &TranscodeJob) -> Self {
        Self::new(&job.input, &job.output)
            .video_bitrate(job.bitrate.clone())
            .video_codec(job.codec.as_ffmpeg_codec())
            .audio_codec(AUDIO_PASSTHROUGH)
            .video_filter(scale_filter())
    }

    /// Add an output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set target video bitrate.
    pub fn video_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:v").output_arg(bitrate)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set video filter.
    pub fn video_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-vf").output_arg(filter)
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Value following `flag` in the output arguments, if present.
    pub fn output_arg_value(&self, flag: &str) -> Option<&str> {
        self.output_args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.output_args.get(i + 1))
            .map(String::as_str)
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        // Partial outputs of a cancelled run are replaced
        args.push("-y".to_string());

        // Stats stay on stderr; stdin is never read
        args.push("-hide_banner".to_string());
        args.push("-nostdin".to_string());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Arguments for an information-only run that prints the input summary.
pub fn probe_args(input: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-nostdin".to_string(),
        "-i".to_string(),
        input.to_string_lossy().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcomp_models::VideoCodec;

    #[test]
    fn test_command_from_software_job() {
        let job = TranscodeJob::new("in/a.mkv", "out/a.mp4", "2M", VideoCodec::select(false));
        let cmd = TranscodeCommand::from_job(&job);

        assert_eq!(cmd.output_arg_value("-b:v"), Some("2M"));
        assert_eq!(cmd.output_arg_value("-c:v"), Some("libx264"));
        assert_eq!(cmd.output_arg_value("-c:a"), Some("copy"));
        assert_eq!(cmd.output_arg_value("-vf"), Some("scale=1440:1080"));

        let args = cmd.build_args();
        assert_eq!(args.first().map(String::as_str), Some("-y"));
        let input_pos = args.iter().position(|a| a == "-i").unwrap();
        assert_eq!(args[input_pos + 1], "in/a.mkv");
        assert_eq!(args.last().map(String::as_str), Some("out/a.mp4"));
        // Encoder options go after the input
        let codec_pos = args.iter().position(|a| a == "-c:v").unwrap();
        assert!(codec_pos > input_pos);
    }

    #[test]
    fn test_command_from_hardware_job() {
        let job = TranscodeJob::new("a.mkv", "a.mp4", "1500k", VideoCodec::select(true));
        let cmd = TranscodeCommand::from_job(&job);
        assert_eq!(cmd.output_arg_value("-c:v"), Some("h264_nvenc"));
        assert_eq!(cmd.output_arg_value("-b:v"), Some("1500k"));
    }

    #[test]
    fn test_probe_args() {
        let args = probe_args(Path::new("movie.mkv"));
        assert_eq!(args, vec!["-hide_banner", "-nostdin", "-i", "movie.mkv"]);
    }
}
