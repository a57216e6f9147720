//! System action issued after a batch that ran to completion.

use std::process::{Command, Stdio};
use tracing::info;

use vcomp_models::PostTask;

use crate::error::{WorkerError, WorkerResult};

/// Performs the post-batch action.
#[cfg_attr(test, mockall::automock)]
pub trait PostTaskRunner: Send + Sync {
    /// Issue `task`. Fire-and-forget: the command is started, not awaited.
    fn execute(&self, task: PostTask) -> WorkerResult<()>;
}

/// Runs the operating system's shutdown or hibernate command.
#[derive(Debug, Clone, Default)]
pub struct SystemPostTask {
    dry_run: bool,
}

impl SystemPostTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only log the command that would run.
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

/// Program and arguments for `task` on this platform.
pub fn command_for(task: PostTask) -> Option<(&'static str, &'static [&'static str])> {
    match task {
        PostTask::None => None,
        PostTask::Shutdown => Some(shutdown_command()),
        PostTask::Hibernate => Some(hibernate_command()),
    }
}

#[cfg(windows)]
fn shutdown_command() -> (&'static str, &'static [&'static str]) {
    ("shutdown", &["/s", "/t", "1"])
}

#[cfg(windows)]
fn hibernate_command() -> (&'static str, &'static [&'static str]) {
    ("shutdown", &["/h", "/t", "1"])
}

#[cfg(target_os = "macos")]
fn shutdown_command() -> (&'static str, &'static [&'static str]) {
    ("shutdown", &["-h", "now"])
}

#[cfg(target_os = "macos")]
fn hibernate_command() -> (&'static str, &'static [&'static str]) {
    ("pmset", &["sleepnow"])
}

#[cfg(not(any(windows, target_os = "macos")))]
fn shutdown_command() -> (&'static str, &'static [&'static str]) {
    ("systemctl", &["poweroff"])
}

#[cfg(not(any(windows, target_os = "macos")))]
fn hibernate_command() -> (&'static str, &'static [&'static str]) {
    ("systemctl", &["hibernate"])
}

impl PostTaskRunner for SystemPostTask {
    fn execute(&self, task: PostTask) -> WorkerResult<()> {
        let Some((program, args)) = command_for(task) else {
            return Ok(());
        };
        let command_line = format!("{} {}", program, args.join(" "));

        if self.dry_run {
            info!(post_task = %task, "Dry run, not executing: {}", command_line);
            return Ok(());
        }

        info!(post_task = %task, "Executing post-task: {}", command_line);
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| WorkerError::post_task_failed(format!("{}: {}", command_line, e)))?;
        Ok(())
    }
}
