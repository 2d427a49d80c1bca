//! Application service: remote command execution with live output.
//!
//! One command runs at a time. While it runs, stdout and stderr are read
//! concurrently, split into lines, and funnelled through a single channel
//! so the reporter is only ever called from one place.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::application::ports::{ProgressReporter, RemoteProcess, RemoteTransport};
use crate::domain::shell;
use crate::domain::{CommandFailure, ExecError, ExitOutcome, Phase, ProvisionError};

/// Which output handle a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// One complete line of remote output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: StreamKind,
    pub text: String,
}

/// Read `reader` to the end, sending each line to `tx` as soon as it is
/// complete.
///
/// A trailing fragment without a newline is sent as a final line. Read
/// errors end the stream like EOF. Dropping `tx` on return is the
/// completion signal: the receiver closes once every sender is gone.
pub async fn stream_lines<R>(reader: R, stream: StreamKind, tx: mpsc::UnboundedSender<OutputLine>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = strip_line_ending(&buf);
                let text = String::from_utf8_lossy(line).into_owned();
                tracing::trace!(?stream, %text, "remote output");
                if tx.send(OutputLine { stream, text }).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::debug!(?stream, error = %e, "remote output stream ended with error");
                break;
            }
        }
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Run `command` on the remote host, streaming its output to `reporter`.
///
/// With `sudo` the command is wrapped to run as root. The command string is
/// reported before it starts. Returns only after the command has exited and
/// both output streams are drained.
///
/// # Errors
///
/// Returns [`ExecError::Transport`] if the transport fails to start or wait
/// for the command, and [`ExecError::Failed`] on a non-zero exit status.
pub async fn run_command(
    transport: &impl RemoteTransport,
    reporter: &impl ProgressReporter,
    command: &str,
    sudo: bool,
) -> Result<(), ExecError> {
    let command = if sudo {
        shell::escalate(command)
    } else {
        command.to_string()
    };
    reporter.step(&command);
    tracing::debug!(%command, "starting remote command");

    let transport_err = |e: anyhow::Error| ExecError::Transport {
        command: command.clone(),
        source: e.into(),
    };

    let mut process = transport.start(&command).await.map_err(transport_err)?;
    let (stdout, stderr) = process.take_streams().map_err(transport_err)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (status, (), (), ()) = tokio::join!(
        process.wait(),
        stream_lines(stdout, StreamKind::Stdout, tx.clone()),
        stream_lines(stderr, StreamKind::Stderr, tx),
        async {
            while let Some(line) = rx.recv().await {
                reporter.output(&line.text);
            }
        },
    );

    let outcome = ExitOutcome::new(status.map_err(transport_err)?);
    tracing::debug!(%command, status = outcome.status, "remote command finished");
    outcome.into_result(&command)?;
    Ok(())
}

/// How a phase treats a command's exit status.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExitPolicy {
    pub sudo: bool,
    /// Report non-zero exits as warnings instead of failing the phase.
    pub ignore_exit_codes: bool,
}

/// Run `command` inside `phase`, applying `policy`.
///
/// Tolerated failures are reported as warnings and appended to `ignored`.
///
/// # Errors
///
/// Returns a [`ProvisionError`] attributed to `phase` on transport failure,
/// or on a non-zero exit when the policy does not ignore it.
pub async fn run_in_phase(
    transport: &impl RemoteTransport,
    reporter: &impl ProgressReporter,
    command: &str,
    phase: Phase,
    policy: ExitPolicy,
    ignored: &mut Vec<CommandFailure>,
) -> Result<(), ProvisionError> {
    match run_command(transport, reporter, command, policy.sudo).await {
        Ok(()) => Ok(()),
        Err(ExecError::Failed(failure)) if policy.ignore_exit_codes => {
            tracing::warn!(%phase, status = failure.status, "ignoring non-zero exit status");
            reporter.warn(&format!("{failure} (ignored)"));
            ignored.push(failure);
            Ok(())
        }
        Err(e) => Err(ProvisionError::from_exec(phase, e)),
    }
}
