//! Encoder process seam.
//!
//! [`Encoder`] is the narrow interface the supervisor talks to: run a probe
//! and return its diagnostic text, or spawn a transcode whose diagnostic
//! stream is read line by line. [`FfmpegEncoder`] is the real implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tracing::{debug, warn};

use crate::command::{probe_args, TranscodeCommand};
use crate::error::{MediaError, MediaResult};

/// Something that can probe and transcode media files.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Run an information-only pass and return the diagnostic text.
    async fn probe(&self, input: &Path) -> MediaResult<String>;

    /// Start a transcode child process.
    async fn spawn(&self, command: &TranscodeCommand) -> MediaResult<Box<dyn EncoderProcess>>;
}

/// A running transcode.
#[async_trait]
pub trait EncoderProcess: Send {
    /// Next diagnostic line, or `None` once the stream has closed.
    async fn next_line(&mut self) -> MediaResult<Option<String>>;

    /// Ask the process to stop gracefully and wait for it to exit.
    async fn terminate(&mut self) -> MediaResult<()>;

    /// Wait for a natural exit; a non-zero status is an error.
    async fn wait(&mut self) -> MediaResult<()>;
}

/// Line reader for FFmpeg's diagnostic stream.
///
/// FFmpeg rewrites its stats line in place with `\r`, so both `\r` and `\n`
/// terminate a line. Empty lines are dropped and invalid UTF-8 is replaced.
pub struct DiagnosticLines<R> {
    reader: R,
}

impl<R: AsyncBufRead + Unpin> DiagnosticLines<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let mut buf = Vec::new();
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if buf.is_empty() {
                    return Ok(None);
                }
                break;
            }

            match available.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(end) => {
                    buf.extend_from_slice(&available[..end]);
                    self.reader.consume(end + 1);
                    if !buf.is_empty() {
                        break;
                    }
                }
                None => {
                    let len = available.len();
                    buf.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }
        Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
    }
}

/// Encoder backed by the `ffmpeg` command-line tool.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    binary: PathBuf,
}

impl FfmpegEncoder {
    /// Locate `ffmpeg` on `PATH`.
    pub fn from_path() -> MediaResult<Self> {
        let binary = which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;
        Ok(Self { binary })
    }

    /// Use an explicit binary.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn binary_name(&self) -> String {
        self.binary.display().to_string()
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn probe(&self, input: &Path) -> MediaResult<String> {
        let args = probe_args(input);
        debug!("Probing: {} {}", self.binary.display(), args.join(" "));

        // FFmpeg exits non-zero without an output file; only stderr matters here.
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::spawn_failed(self.binary_name(), e))?;

        Ok(String::from_utf8_lossy(&output.stderr).into_owned())
    }

    async fn spawn(&self, command: &TranscodeCommand) -> MediaResult<Box<dyn EncoderProcess>> {
        let args = command.build_args();
        debug!("Running FFmpeg: {} {}", self.binary.display(), args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::spawn_failed(self.binary_name(), e))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("FFmpeg stderr not captured"))?;

        Ok(Box::new(FfmpegProcess {
            child,
            lines: DiagnosticLines::new(BufReader::new(stderr)),
        }))
    }
}

/// A running FFmpeg child with its stderr reader.
pub struct FfmpegProcess {
    child: Child,
    lines: DiagnosticLines<BufReader<ChildStderr>>,
}

impl FfmpegProcess {
    /// Send the graceful stop request.
    #[cfg(unix)]
    fn request_stop(&mut self) -> MediaResult<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // Already reaped
        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let pid = i32::try_from(pid).map_err(|_| MediaError::internal("PID out of range"))?;
        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) | Err(nix::errno::Errno::ESRCH) => Ok(()),
            Err(e) => Err(MediaError::internal(format!("Failed to signal FFmpeg: {}", e))),
        }
    }

    #[cfg(not(unix))]
    fn request_stop(&mut self) -> MediaResult<()> {
        match self.child.start_kill() {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl EncoderProcess for FfmpegProcess {
    async fn next_line(&mut self) -> MediaResult<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    async fn terminate(&mut self) -> MediaResult<()> {
        self.request_stop()?;

        // Keep draining stderr so FFmpeg never blocks on a full pipe while finishing up
        let Self { child, lines } = self;
        let drain = async {
            while let Ok(Some(_)) = lines.next_line().await {}
        };
        let (_, status) = tokio::join!(drain, child.wait());
        let status = status?;
        debug!("FFmpeg terminated with {}", status);
        Ok(())
    }

    async fn wait(&mut self) -> MediaResult<()> {
        let status = self.child.wait().await?;
        if status.success() {
            Ok(())
        } else {
            warn!("FFmpeg exited with {}", status);
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                status.code(),
            ))
        }
    }
}
