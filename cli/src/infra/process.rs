//! `RemoteProcess` backed by a local child process.
//!
//! Both transports start a local program (`ssh` or `sh`) whose stdio is the
//! remote command's stdio, so they share this wrapper.

use std::process::{ExitStatus, Stdio};

use anyhow::{Context, Result};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::application::ports::RemoteProcess;

/// A spawned child with piped stdout/stderr.
#[derive(Debug)]
pub struct ChildProcess {
    program: String,
    child: Child,
}

impl ChildProcess {
    /// Spawn `cmd` with stdin closed and stdout/stderr piped.
    ///
    /// The child is killed if this value is dropped before it exits.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned.
    pub fn spawn(mut cmd: Command) -> Result<Self> {
        let program = cmd.as_std().get_program().to_string_lossy().into_owned();
        let child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;
        Ok(Self { program, child })
    }
}

impl RemoteProcess for ChildProcess {
    type Stdout = ChildStdout;
    type Stderr = ChildStderr;

    fn take_streams(&mut self) -> Result<(ChildStdout, ChildStderr)> {
        let stdout = self
            .child
            .stdout
            .take()
            .with_context(|| format!("{} stdout already taken", self.program))?;
        let stderr = self
            .child
            .stderr
            .take()
            .with_context(|| format!("{} stderr already taken", self.program))?;
        Ok((stdout, stderr))
    }

    async fn wait(&mut self) -> Result<i32> {
        let status = self
            .child
            .wait()
            .await
            .with_context(|| format!("waiting for {}", self.program))?;
        Ok(exit_code(status))
    }
}

/// Exit code of `status`; a signal-terminated process maps to `128 + signal`
/// the way shells report it.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    -1
}
