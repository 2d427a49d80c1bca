//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tokio::io::AsyncRead;

use crate::domain::RawProvisionerConfig;

// ── Remote transport ──────────────────────────────────────────────────────────

/// A command started on the remote host.
///
/// Output handles are detached once with [`RemoteProcess::take_streams`] so
/// they can be read while [`RemoteProcess::wait`] is pending.
#[allow(async_fn_in_trait)]
pub trait RemoteProcess {
    type Stdout: AsyncRead + Unpin;
    type Stderr: AsyncRead + Unpin;

    /// Take the live stdout and stderr handles.
    ///
    /// # Errors
    ///
    /// Returns an error if the handles were already taken.
    fn take_streams(&mut self) -> Result<(Self::Stdout, Self::Stderr)>;

    /// Wait for the command to finish and return its exit status.
    async fn wait(&mut self) -> Result<i32>;
}

/// Connection to the host being provisioned.
///
/// Implementations must allow both output handles of one started command to
/// be read concurrently.
#[allow(async_fn_in_trait)]
pub trait RemoteTransport {
    type Process: RemoteProcess;

    /// Start `command` through the remote shell.
    async fn start(&self, command: &str) -> Result<Self::Process>;

    /// Write the bytes of `source` to the remote file `remote`.
    async fn upload_file(
        &self,
        remote: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<()>;

    /// Copy the contents of the local directory `local` into the existing
    /// remote directory `remote`.
    ///
    /// A `local` path ending in a separator means "copy what is inside", not
    /// the directory itself.
    async fn upload_dir(&self, remote: &str, local: &Path) -> Result<()>;
}

// ── Local filesystem ──────────────────────────────────────────────────────────

/// Kind of an existing local filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Other,
}

/// Read-only access to the controller's filesystem.
#[allow(async_fn_in_trait)]
pub trait LocalFs {
    type File: AsyncRead + Unpin + Send;

    /// Kind of the entry at `path`, following symlinks.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error, `NotFound` included.
    async fn stat(&self, path: &Path) -> std::io::Result<EntryKind>;

    /// Open `path` for reading.
    async fn open(&self, path: &Path) -> std::io::Result<Self::File>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Forward one line of remote command output verbatim.
    fn output(&self, line: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Source of the raw provisioner configuration.
pub trait ConfigStore {
    /// Load and parse the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    fn load(&self) -> Result<RawProvisionerConfig>;

    /// Location the configuration is read from.
    fn path(&self) -> PathBuf;
}
