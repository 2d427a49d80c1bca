//! Infrastructure implementation of `RemoteTransport` over OpenSSH.
//!
//! Every operation spawns the system `ssh` client, so authentication, host
//! key checking, and `~/.ssh/config` behave exactly as for an interactive
//! login. `BatchMode` is forced on; there is no terminal to answer prompts.

use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use crate::application::ports::RemoteTransport;
use crate::domain::SshConnection;
use crate::domain::shell;
use crate::infra::process::ChildProcess;

const SSH_PROGRAM: &str = "ssh";

/// OpenSSH-backed transport for one host.
#[derive(Debug, Clone)]
pub struct SshTransport {
    target: SshConnection,
}

impl SshTransport {
    #[must_use]
    pub fn new(target: SshConnection) -> Self {
        Self { target }
    }

    /// `[user@]host`
    #[must_use]
    pub fn destination(&self) -> String {
        match &self.target.user {
            Some(user) => format!("{user}@{}", self.target.host),
            None => self.target.host.clone(),
        }
    }

    /// Arguments for `ssh` running `remote_command` on the target.
    #[must_use]
    pub fn ssh_args(&self, remote_command: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-T".into(), "-o".into(), "BatchMode=yes".into()];
        if let Some(port) = self.target.port {
            args.push("-p".into());
            args.push(port.to_string().into());
        }
        if let Some(identity) = &self.target.identity_file {
            args.push("-i".into());
            args.push(identity.as_os_str().to_os_string());
        }
        for option in &self.target.options {
            args.push("-o".into());
            args.push(option.into());
        }
        args.push(self.destination().into());
        args.push(remote_command.into());
        args
    }

    fn command(&self, remote_command: &str) -> Command {
        let mut cmd = Command::new(SSH_PROGRAM);
        cmd.args(self.ssh_args(remote_command));
        cmd
    }
}

impl RemoteTransport for SshTransport {
    type Process = ChildProcess;

    async fn start(&self, command: &str) -> Result<ChildProcess> {
        ChildProcess::spawn(self.command(command))
            .with_context(|| format!("ssh {}", self.destination()))
    }

    async fn upload_file(
        &self,
        remote: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<()> {
        let remote_cmd = format!("cat > {}", shell::quote(remote));
        feed_stdin(self.command(&remote_cmd), source, "ssh upload").await
    }

    async fn upload_dir(&self, remote: &str, local: &Path) -> Result<()> {
        let remote_cmd = format!("tar -C {} -xf -", shell::quote(remote));
        let args = self.ssh_args(&remote_cmd);
        let local = local.to_path_buf();
        tokio::task::spawn_blocking(move || send_tree(SSH_PROGRAM, &args, &local))
            .await
            .context("upload task failed")?
    }
}

/// Copy `source` into the stdin of `cmd`.
///
/// Stderr is read while stdin is written; a remote end that fills the
/// stderr pipe would otherwise stop reading its input.
async fn feed_stdin(
    mut cmd: Command,
    source: &mut (dyn AsyncRead + Unpin + Send),
    what: &str,
) -> Result<()> {
    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .context("failed to spawn ssh")?;

    let mut stdin = child.stdin.take().context("ssh stdin unavailable")?;
    let mut stderr = child.stderr.take().context("ssh stderr unavailable")?;

    let write = async {
        let copied = tokio::io::copy(source, &mut stdin).await;
        let shutdown = stdin.shutdown().await;
        drop(stdin);
        copied.and(shutdown)
    };
    let mut errors = Vec::new();
    let (written, drained) = tokio::join!(write, stderr.read_to_end(&mut errors));

    let status = child.wait().await.context("waiting for ssh")?;
    ensure_success(what, &status, &errors)?;
    drained.context("reading ssh stderr")?;
    written.context("streaming file to ssh")?;
    Ok(())
}

/// Stream `local` as a tar archive into `program args...`.
///
/// Runs on a blocking thread: the `tar` builder writes synchronously.
/// Stderr is drained on its own thread for the same reason as [`feed_stdin`].
fn send_tree(program: &str, args: &[OsString], local: &Path) -> Result<()> {
    let mut child = std::process::Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("failed to spawn ssh")?;

    let stdin = child.stdin.take().context("ssh stdin unavailable")?;
    let mut stderr = child.stderr.take().context("ssh stderr unavailable")?;
    let drain = std::thread::spawn(move || {
        let mut errors = Vec::new();
        stderr.read_to_end(&mut errors).map(|_| errors)
    });

    let archived = write_archive(stdin, local);
    let status = child.wait().context("waiting for ssh")?;
    let errors = drain
        .join()
        .map_err(|_| anyhow::anyhow!("ssh stderr reader panicked"))?
        .context("reading ssh stderr")?;

    ensure_success("ssh tar upload", &status, &errors)?;
    archived.with_context(|| format!("archiving {}", local.display()))?;
    Ok(())
}

/// Write the contents of `local` as a tar archive; `out` is closed on return.
fn write_archive(out: impl Write, local: &Path) -> std::io::Result<()> {
    let mut builder = tar::Builder::new(out);
    builder.follow_symlinks(false);
    builder.append_dir_all(".", local)?;
    builder.into_inner().map(drop)
}

fn ensure_success(what: &str, status: &std::process::ExitStatus, stderr: &[u8]) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(stderr);
    anyhow::bail!("{what} failed ({status}): {}", stderr.trim())
}
