// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launch, wait on and interrupt helper binaries.

use std::io::Write;
use std::os::fd::AsFd;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

use cvd_core::Envs;

/// How long a process group gets to react to SIGTERM before SIGKILL.
const INTERRUPT_GRACE: Duration = Duration::from_secs(2);
const WAIT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to run {bin}: {source}")]
    Spawn {
        bin: String,
        #[source]
        source: std::io::Error,
    },
    #[error("a child process is already being supervised")]
    AlreadyRunning,
    #[error("no child process is being supervised")]
    NothingRunning,
    #[error("{context} exited with code {code}{stderr_tail}")]
    Exited { context: String, code: i32, stderr_tail: String },
    #[error("{context} was killed by signal {signal}")]
    Signalled { context: String, signal: i32 },
    #[error("{context} did not finish in time")]
    TimedOut { context: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Fully-specified child process invocation. The environment given here
/// replaces the child's environment wholesale.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub bin_path: PathBuf,
    pub args: Vec<String>,
    pub envs: Envs,
    pub working_dir: Option<PathBuf>,
    /// Route the child's stdout onto our stderr. The parent's stdout is
    /// reserved for status JSON.
    pub stdout_to_stderr: bool,
}

impl CommandSpec {
    pub fn new(bin_path: impl Into<PathBuf>) -> Self {
        Self {
            bin_path: bin_path.into(),
            args: Vec::new(),
            envs: Envs::new(),
            working_dir: None,
            stdout_to_stderr: false,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, envs: Envs) -> Self {
        self.envs = envs;
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn stdout_to_stderr(mut self) -> Self {
        self.stdout_to_stderr = true;
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.bin_path);
        command.args(&self.args).env_clear().envs(&self.envs);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        // Own process group: supervisor signals must not escape to us.
        command.process_group(0);
        command
    }

    fn bin_name(&self) -> String {
        self.bin_path.to_string_lossy().into_owned()
    }
}

/// Result of waiting for a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    NormalExit(i32),
    Signalled(i32),
    Timeout,
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitStatus::NormalExit(code),
            None => ExitStatus::Signalled(status.signal().unwrap_or(0)),
        }
    }
}

/// Map anything but a normal exit with `expected_code` to an error.
pub fn check_normal_exit(
    context: &str,
    status: ExitStatus,
    expected_code: i32,
) -> Result<(), SupervisorError> {
    match status {
        ExitStatus::NormalExit(code) if code == expected_code => Ok(()),
        ExitStatus::NormalExit(code) => Err(SupervisorError::Exited {
            context: context.to_string(),
            code,
            stderr_tail: String::new(),
        }),
        ExitStatus::Signalled(signal) => {
            Err(SupervisorError::Signalled { context: context.to_string(), signal })
        }
        ExitStatus::Timeout => Err(SupervisorError::TimedOut { context: context.to_string() }),
    }
}

#[derive(Default)]
struct Inner {
    child: Option<Child>,
    pgid: Option<Pid>,
}

/// Supervises one child at a time on behalf of a handler. Cloneable so an
/// interrupt listener can signal the child the handler is waiting on.
#[derive(Clone, Default)]
pub struct Supervisor {
    inner: Arc<Mutex<Inner>>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn the child in its own process group.
    pub fn launch(&self, spec: &CommandSpec) -> Result<(), SupervisorError> {
        let mut inner = self.inner.lock();
        if inner.child.is_some() {
            return Err(SupervisorError::AlreadyRunning);
        }
        let mut command = spec.command();
        if spec.stdout_to_stderr {
            let stderr = std::io::stderr().as_fd().try_clone_to_owned()?;
            command.stdout(Stdio::from(stderr));
        }
        debug!(bin = %spec.bin_path.display(), args = ?spec.args, "launching helper");
        let child = command
            .spawn()
            .map_err(|source| SupervisorError::Spawn { bin: spec.bin_name(), source })?;
        inner.pgid = Some(Pid::from_raw(child.id() as i32));
        inner.child = Some(child);
        Ok(())
    }

    /// Block until the supervised child terminates.
    pub fn wait(&self) -> Result<ExitStatus, SupervisorError> {
        let mut child = self.take_child()?;
        let status = child.wait();
        self.clear();
        Ok(status?.into())
    }

    /// Wait with a deadline. Returns [`ExitStatus::Timeout`] when the child
    /// is still running after `timeout`; the child keeps running.
    pub fn wait_timeout(&self, timeout: Duration) -> Result<ExitStatus, SupervisorError> {
        let mut child = self.take_child()?;
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                self.clear();
                return Ok(status.into());
            }
            if Instant::now() >= deadline {
                // Put the child back so it can still be waited on or killed.
                self.inner.lock().child = Some(child);
                return Ok(ExitStatus::Timeout);
            }
            std::thread::sleep(WAIT_POLL);
        }
    }

    /// Send SIGTERM to the child's process group and escalate to SIGKILL
    /// after a short grace period. Safe to call from an interrupt listener
    /// while another thread waits on the child.
    pub fn interrupt(&self) -> Result<(), SupervisorError> {
        let Some(pgid) = self.inner.lock().pgid else {
            return Err(SupervisorError::NothingRunning);
        };
        debug!(pgid = pgid.as_raw(), "interrupting helper process group");
        if killpg(pgid, Signal::SIGTERM).is_err() {
            // Group already gone.
            return Ok(());
        }
        let deadline = Instant::now() + INTERRUPT_GRACE;
        while Instant::now() < deadline {
            if killpg(pgid, None).is_err() {
                return Ok(());
            }
            std::thread::sleep(WAIT_POLL);
        }
        warn!(pgid = pgid.as_raw(), "process group survived SIGTERM, sending SIGKILL");
        let _ = killpg(pgid, Signal::SIGKILL);
        Ok(())
    }

    fn take_child(&self) -> Result<Child, SupervisorError> {
        self.inner.lock().child.take().ok_or(SupervisorError::NothingRunning)
    }

    fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.child = None;
        inner.pgid = None;
    }
}

/// Run a helper with captured stdio, optionally feeding it stdin bytes.
/// Used for discovery probes such as `--helpxml`.
pub fn run_managed(
    spec: &CommandSpec,
    stdin_bytes: Option<&[u8]>,
) -> Result<(String, String, ExitStatus), SupervisorError> {
    let mut command = spec.command();
    command.stdin(if stdin_bytes.is_some() { Stdio::piped() } else { Stdio::null() });
    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = command
        .spawn()
        .map_err(|source| SupervisorError::Spawn { bin: spec.bin_name(), source })?;
    if let (Some(bytes), Some(mut stdin)) = (stdin_bytes, child.stdin.take()) {
        stdin.write_all(bytes)?;
    }
    let output = child.wait_with_output()?;
    Ok((
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        output.status.into(),
    ))
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
