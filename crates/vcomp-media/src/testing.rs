//! Scripted in-memory encoder for tests.
//!
//! Each input file name maps to a [`Script`] describing what the probe prints
//! and which stats lines the transcode emits. The encoder records every probe,
//! spawn and terminate so tests can assert on them.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::cancel::CancellationToken;
use crate::command::TranscodeCommand;
use crate::encoder::{Encoder, EncoderProcess};
use crate::error::{MediaError, MediaResult};

/// Behaviour of the fake encoder for one input.
#[derive(Debug, Clone, Default)]
pub struct Script {
    probe_output: String,
    lines: Vec<String>,
    cancel_after: Option<(usize, CancellationToken)>,
    fail_spawn: bool,
    exit_failure: bool,
}

impl Script {
    /// A file of `duration` (`HH:MM:SS.ff`) whose transcode reports each of `times`.
    pub fn transcode(duration: &str, times: &[&str]) -> Self {
        let probe_output = format!(
            "Input #0, matroska,webm, from 'input.mkv':\n  Duration: {}, start: 0.000000, bitrate: 4000 kb/s\n  Stream #0:0: Video: h264\nAt least one output file must be specified\n",
            duration
        );
        let mut lines = vec![
            "Stream mapping:".to_string(),
            "Press [q] to stop, [?] for help".to_string(),
        ];
        lines.extend(times.iter().enumerate().map(|(i, t)| {
            format!(
                "frame={:5} fps= 48 q=28.0 size=   {}kB time={} bitrate= 900.0kbits/s speed=2.0x",
                (i + 1) * 100,
                (i + 1) * 512,
                t
            )
        }));
        Self {
            probe_output,
            lines,
            ..Default::default()
        }
    }

    /// A probe that prints no duration marker.
    pub fn without_duration() -> Self {
        Self {
            probe_output: "Input #0, image2, from 'input.mkv':\n  Duration: N/A, bitrate: N/A\n"
                .to_string(),
            ..Default::default()
        }
    }

    /// Set `token` when the `n`th stats line is handed out (1-based).
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    /// Make spawning the transcode fail.
    pub fn failing_spawn(mut self) -> Self {
        self.fail_spawn = true;
        self
    }

    /// Exit non-zero after the stream ends.
    pub fn exit_failure(mut self) -> Self {
        self.exit_failure = true;
        self
    }
}

#[derive(Debug, Default)]
struct Recorded {
    probed: Vec<PathBuf>,
    spawned: Vec<TranscodeCommand>,
    terminated: usize,
}

/// Fake [`Encoder`] driven by per-file scripts.
#[derive(Debug, Clone, Default)]
pub struct ScriptedEncoder {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    recorded: Arc<Mutex<Recorded>>,
}

impl ScriptedEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the script for inputs whose file name is `file_name`.
    pub fn with_script(self, file_name: impl Into<String>, script: Script) -> Self {
        self.scripts.lock().unwrap().insert(file_name.into(), script);
        self
    }

    pub fn probe_count(&self) -> usize {
        self.recorded.lock().unwrap().probed.len()
    }

    pub fn spawn_count(&self) -> usize {
        self.recorded.lock().unwrap().spawned.len()
    }

    pub fn terminate_count(&self) -> usize {
        self.recorded.lock().unwrap().terminated
    }

    /// Every transcode command spawned so far, in order.
    pub fn spawned(&self) -> Vec<TranscodeCommand> {
        self.recorded.lock().unwrap().spawned.clone()
    }

    fn script_for(&self, path: &Path) -> MediaResult<Script> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.scripts
            .lock()
            .unwrap()
            .get(&name)
            .cloned()
            .ok_or_else(|| MediaError::FileNotFound(path.to_path_buf()))
    }
}

#[async_trait]
impl Encoder for ScriptedEncoder {
    async fn probe(&self, input: &Path) -> MediaResult<String> {
        self.recorded.lock().unwrap().probed.push(input.to_path_buf());
        Ok(self.script_for(input)?.probe_output)
    }

    async fn spawn(&self, command: &TranscodeCommand) -> MediaResult<Box<dyn EncoderProcess>> {
        let script = self.script_for(command.input())?;
        if script.fail_spawn {
            return Err(MediaError::spawn_failed(
                "ffmpeg",
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
            ));
        }
        self.recorded.lock().unwrap().spawned.push(command.clone());

        let stats_lines = script
            .lines
            .iter()
            .filter(|l| l.contains("time="))
            .count();
        let header_lines = script.lines.len() - stats_lines;
        Ok(Box::new(ScriptedProcess {
            lines: script.lines.into_iter().collect(),
            handed_out: 0,
            cancel_at: script
                .cancel_after
                .map(|(n, token)| (header_lines + n, token)),
            exit_failure: script.exit_failure,
            recorded: Arc::clone(&self.recorded),
        }))
    }
}

struct ScriptedProcess {
    lines: VecDeque<String>,
    handed_out: usize,
    cancel_at: Option<(usize, CancellationToken)>,
    exit_failure: bool,
    recorded: Arc<Mutex<Recorded>>,
}

#[async_trait]
impl EncoderProcess for ScriptedProcess {
    async fn next_line(&mut self) -> MediaResult<Option<String>> {
        let line = self.lines.pop_front();
        if line.is_some() {
            self.handed_out += 1;
            if let Some((at, token)) = &self.cancel_at {
                if self.handed_out == *at {
                    token.cancel();
                }
            }
        }
        Ok(line)
    }

    async fn terminate(&mut self) -> MediaResult<()> {
        self.lines.clear();
        self.recorded.lock().unwrap().terminated += 1;
        Ok(())
    }

    async fn wait(&mut self) -> MediaResult<()> {
        if self.exit_failure {
            Err(MediaError::ffmpeg_failed("FFmpeg exited with non-zero status", Some(1)))
        } else {
            Ok(())
        }
    }
}
