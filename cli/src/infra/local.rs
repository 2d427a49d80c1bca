//! `RemoteTransport` for the machine the CLI runs on.
//!
//! Commands run under `sh -c`; uploads are plain filesystem copies.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncWriteExt};
use tokio::process::Command;

use crate::application::ports::RemoteTransport;
use crate::infra::process::ChildProcess;

/// Transport that treats the local host as the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalTransport;

impl RemoteTransport for LocalTransport {
    type Process = ChildProcess;

    async fn start(&self, command: &str) -> Result<ChildProcess> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        ChildProcess::spawn(cmd)
    }

    async fn upload_file(
        &self,
        remote: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<()> {
        let mut file = tokio::fs::File::create(remote)
            .await
            .with_context(|| format!("create {remote}"))?;
        tokio::io::copy(source, &mut file)
            .await
            .with_context(|| format!("write {remote}"))?;
        file.flush().await.with_context(|| format!("flush {remote}"))?;
        Ok(())
    }

    async fn upload_dir(&self, remote: &str, local: &Path) -> Result<()> {
        let from = local.to_path_buf();
        let to = Path::new(remote).to_path_buf();
        tokio::task::spawn_blocking(move || copy_tree(&from, &to))
            .await
            .context("copy task failed")?
    }
}

/// Copy everything inside `from` into the existing directory `to`.
fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    let mut pending = vec![(from.to_path_buf(), to.to_path_buf())];
    while let Some((src_dir, dst_dir)) = pending.pop() {
        let entries =
            std::fs::read_dir(&src_dir).with_context(|| format!("read {}", src_dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("read {}", src_dir.display()))?;
            let src = entry.path();
            let dst = dst_dir.join(entry.file_name());
            let file_type = entry
                .file_type()
                .with_context(|| format!("stat {}", src.display()))?;
            if file_type.is_dir() {
                std::fs::create_dir_all(&dst)
                    .with_context(|| format!("create {}", dst.display()))?;
                pending.push((src, dst));
            } else if file_type.is_symlink() {
                copy_symlink(&src, &dst)?;
            } else {
                std::fs::copy(&src, &dst)
                    .with_context(|| format!("copy {} to {}", src.display(), dst.display()))?;
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    let target = std::fs::read_link(src).with_context(|| format!("readlink {}", src.display()))?;
    if dst.symlink_metadata().is_ok() {
        std::fs::remove_file(dst).with_context(|| format!("replace {}", dst.display()))?;
    }
    std::os::unix::fs::symlink(&target, dst)
        .with_context(|| format!("symlink {}", dst.display()))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> Result<()> {
    std::fs::copy(src, dst)
        .map(drop)
        .with_context(|| format!("copy {} to {}", src.display(), dst.display()))
}
