//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::domain::provision::ProvisionReport;

/// Boxed source error for failures raised by port implementations.
///
/// Port traits return `anyhow::Result`; `anyhow::Error` converts into this
/// box and keeps its full cause chain.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors detected in the provisioner configuration before any remote work.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot load configuration from {path}")]
    Load {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("hiera_config_path is invalid: {path}")]
    HieraConfigInvalid {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("hiera_config_path must point to a file: {path}")]
    HieraConfigNotFile { path: PathBuf },

    #[error("manifest_dir is invalid: {path}")]
    ManifestDirInvalid {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest_dir must point to a directory: {path}")]
    ManifestDirNotDirectory { path: PathBuf },

    #[error("module_paths[{index}] is invalid: {path}")]
    ModulePathInvalid {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("module_paths[{index}] must point to a directory: {path}")]
    ModulePathNotDirectory { index: usize, path: PathBuf },

    #[error("manifest_file is invalid: {path}")]
    ManifestFileInvalid {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest_file is required")]
    MissingManifest,

    #[error("staging_directory must not be empty")]
    EmptyStagingDirectory,

    #[error("invalid fact name '{0}': must match ^[A-Za-z_][A-Za-z0-9_]*$")]
    InvalidFactName(String),

    #[error("configuration has {count} invalid path(s)")]
    Invalid { count: usize },

    #[error("no connection configured. Set `connection` in the config file, pass --host, or use --local")]
    MissingConnection,
}

// ── Command errors ────────────────────────────────────────────────────────────

/// A remote command ran to completion with a non-zero exit status.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("command {command:?} exited with non-zero exit status: {status}")]
pub struct CommandFailure {
    /// The exact string handed to the transport.
    pub command: String,
    /// Exit status reported by the transport.
    pub status: i32,
}

/// Errors from a single remote command execution.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The transport could not start the command or lost it while waiting.
    #[error("error executing command {command:?}")]
    Transport {
        command: String,
        #[source]
        source: BoxError,
    },

    /// The command finished with a non-zero exit status.
    #[error(transparent)]
    Failed(#[from] CommandFailure),
}

// ── Transfer errors ───────────────────────────────────────────────────────────

/// Errors from directory creation and uploads.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("creating remote directory {path}")]
    CreateDir {
        path: String,
        #[source]
        source: ExecError,
    },

    #[error("opening {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("inspecting {path}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("uploading {local} to {remote}")]
    Upload {
        local: PathBuf,
        remote: String,
        #[source]
        source: BoxError,
    },

    /// A plain remote command (not a transfer call) failed to run at all.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Phases of a provisioning run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Stage,
    SharedConfig,
    ManifestDir,
    Modules,
    Manifest,
    Agent,
    Converge,
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Stage => "creating staging directory",
            Self::SharedConfig => "uploading hiera config",
            Self::ManifestDir => "uploading manifest dir",
            Self::Modules => "uploading modules",
            Self::Manifest => "uploading manifests",
            Self::Agent => "installing puppet agent",
            Self::Converge => "running puppet",
            Self::Cleanup => "removing staging directory",
        };
        f.write_str(s)
    }
}

/// Terminal error of a provisioning run.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("error {phase}")]
    Transfer {
        phase: Phase,
        #[source]
        source: TransferError,
    },

    #[error("error {phase}")]
    Command {
        phase: Phase,
        #[source]
        source: CommandFailure,
    },

    /// Every phase up to convergence completed; only the staging cleanup failed.
    #[error("{} but removing the staging directory failed", cleanup_outcome(.report))]
    Cleanup {
        report: Box<ProvisionReport>,
        #[source]
        source: TransferError,
    },
}

impl ProvisionError {
    /// Phase the run stopped in, or `None` for configuration errors.
    #[must_use]
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Config(_) => None,
            Self::Transfer { phase, .. } | Self::Command { phase, .. } => Some(*phase),
            Self::Cleanup { .. } => Some(Phase::Cleanup),
        }
    }

    /// `true` when the host converged cleanly and only the cleanup step
    /// failed. Runs that got past convergence only by ignoring a non-zero
    /// exit do not count.
    #[must_use]
    pub fn converged(&self) -> bool {
        matches!(self, Self::Cleanup { report, .. } if report.ignored_failures.is_empty())
    }

    /// Wrap an execution error raised inside `phase`.
    ///
    /// Non-zero exits become [`ProvisionError::Command`]; transport failures
    /// become [`ProvisionError::Transfer`].
    #[must_use]
    pub fn from_exec(phase: Phase, err: ExecError) -> Self {
        match err {
            ExecError::Failed(failure) => Self::Command {
                phase,
                source: failure,
            },
            other => Self::Transfer {
                phase,
                source: TransferError::Exec(other),
            },
        }
    }
}

fn cleanup_outcome(report: &ProvisionReport) -> &'static str {
    if report.ignored_failures.is_empty() {
        "provisioning succeeded"
    } else {
        "provisioning finished with ignored failures"
    }
}
