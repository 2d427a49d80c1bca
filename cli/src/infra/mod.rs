//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: child processes, the ssh
//! client, local file access, and config file loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod config;
pub mod fs;
pub mod local;
pub mod process;
pub mod ssh;

use std::path::Path;

use anyhow::Result;
use tokio::io::AsyncRead;

use crate::application::ports::RemoteTransport;
use crate::domain::ConnectionConfig;

pub use config::YamlConfigStore;
pub use fs::StdFs;
pub use local::LocalTransport;
pub use process::ChildProcess;
pub use ssh::SshTransport;

/// Transport selected from the `connection` section at runtime.
#[derive(Debug, Clone)]
pub enum Transport {
    Ssh(SshTransport),
    Local(LocalTransport),
}

impl Transport {
    #[must_use]
    pub fn from_config(connection: &ConnectionConfig) -> Self {
        match connection {
            ConnectionConfig::Ssh(target) => Self::Ssh(SshTransport::new(target.clone())),
            ConnectionConfig::Local => Self::Local(LocalTransport),
        }
    }

    /// Human-readable target, used in progress messages.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Ssh(t) => t.destination(),
            Self::Local(_) => "localhost".to_string(),
        }
    }
}

impl RemoteTransport for Transport {
    type Process = ChildProcess;

    async fn start(&self, command: &str) -> Result<ChildProcess> {
        match self {
            Self::Ssh(t) => t.start(command).await,
            Self::Local(t) => t.start(command).await,
        }
    }

    async fn upload_file(
        &self,
        remote: &str,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<()> {
        match self {
            Self::Ssh(t) => t.upload_file(remote, source).await,
            Self::Local(t) => t.upload_file(remote, source).await,
        }
    }

    async fn upload_dir(&self, remote: &str, local: &Path) -> Result<()> {
        match self {
            Self::Ssh(t) => t.upload_dir(remote, local).await,
            Self::Local(t) => t.upload_dir(remote, local).await,
        }
    }
}
