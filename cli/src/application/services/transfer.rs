//! Application service: remote directory creation and uploads.

use std::path::{Path, PathBuf};

use crate::application::ports::{LocalFs, ProgressReporter, RemoteTransport};
use crate::application::services::remote_exec::run_command;
use crate::domain::TransferError;
use crate::domain::shell::ShellCommand;

/// Create `dir` (and parents) on the remote host and make it world-writable
/// so an unprivileged connection can populate it.
///
/// # Errors
///
/// Returns [`TransferError::CreateDir`] if either `mkdir` or `chmod` fails.
pub async fn create_remote_dir(
    transport: &impl RemoteTransport,
    reporter: &impl ProgressReporter,
    dir: &str,
) -> Result<(), TransferError> {
    reporter.step(&format!("creating directory: {dir}"));
    let mkdir = ShellCommand::new("mkdir").arg("-p").arg(dir).render();
    let chmod = ShellCommand::new("chmod").arg("777").arg(dir).render();
    for command in [mkdir, chmod] {
        run_command(transport, reporter, &command, false)
            .await
            .map_err(|source| TransferError::CreateDir {
                path: dir.to_string(),
                source,
            })?;
    }
    Ok(())
}

/// Remove `dir` and everything under it on the remote host.
///
/// # Errors
///
/// Returns [`TransferError::Exec`] if the transport fails or `rm` exits non-zero.
pub async fn remove_remote_dir(
    transport: &impl RemoteTransport,
    reporter: &impl ProgressReporter,
    dir: &str,
    sudo: bool,
) -> Result<(), TransferError> {
    let rm = ShellCommand::new("rm").arg("-fr").arg(dir).render();
    run_command(transport, reporter, &rm, sudo).await?;
    Ok(())
}

/// Upload the local file `local` to the remote path `remote`.
///
/// The local handle is owned by this call and released on every return path.
///
/// # Errors
///
/// Returns [`TransferError::Open`] if the file cannot be opened and
/// [`TransferError::Upload`] if the transport rejects it.
pub async fn upload_file(
    transport: &impl RemoteTransport,
    fs: &impl LocalFs,
    local: &Path,
    remote: &str,
) -> Result<(), TransferError> {
    let mut file = fs.open(local).await.map_err(|source| TransferError::Open {
        path: local.to_path_buf(),
        source,
    })?;
    tracing::debug!(local = %local.display(), %remote, "uploading file");
    transport
        .upload_file(remote, &mut file)
        .await
        .map_err(|e| TransferError::Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            source: e.into(),
        })
}

/// Create `remote` and copy the contents of the local directory `local` into it.
///
/// # Errors
///
/// Returns [`TransferError::CreateDir`] or [`TransferError::Upload`].
pub async fn upload_dir(
    transport: &impl RemoteTransport,
    reporter: &impl ProgressReporter,
    local: &Path,
    remote: &str,
) -> Result<(), TransferError> {
    create_remote_dir(transport, reporter, remote).await?;
    let source = contents_of(local);
    tracing::debug!(local = %source.display(), %remote, "uploading directory");
    transport
        .upload_dir(remote, &source)
        .await
        .map_err(|e| TransferError::Upload {
            local: local.to_path_buf(),
            remote: remote.to_string(),
            source: e.into(),
        })
}

/// Append a trailing separator so transports copy what is inside `dir`
/// instead of nesting `dir` itself one level deeper.
#[must_use]
pub fn contents_of(dir: &Path) -> PathBuf {
    let mut s = dir.as_os_str().to_os_string();
    let has_separator = dir
        .to_str()
        .is_some_and(|d| d.ends_with(std::path::MAIN_SEPARATOR) || d.ends_with('/'));
    if !has_separator {
        s.push(std::path::MAIN_SEPARATOR_STR);
    }
    PathBuf::from(s)
}
