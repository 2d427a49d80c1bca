//! Result of a completed provisioning run.

use serde::Serialize;

use crate::domain::error::CommandFailure;
use crate::domain::staging::StagingLayout;

/// Exit status of a finished remote command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub status: i32,
}

impl ExitOutcome {
    #[must_use]
    pub fn new(status: i32) -> Self {
        Self { status }
    }

    #[must_use]
    pub fn success(self) -> bool {
        self.status == 0
    }

    /// Turn a non-zero status into a failure attributed to `command`.
    ///
    /// # Errors
    ///
    /// Returns [`CommandFailure`] when the status is non-zero.
    pub fn into_result(self, command: &str) -> Result<(), CommandFailure> {
        if self.success() {
            Ok(())
        } else {
            Err(CommandFailure {
                command: command.to_string(),
                status: self.status,
            })
        }
    }
}

/// What a provisioning run did on the remote host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub staging: StagingLayout,
    /// Remote module directories in search-path order.
    pub module_paths: Vec<String>,
    /// Remote manifest file or directory handed to `puppet apply`.
    pub manifest_target: String,
    /// Remote hiera config, when one was uploaded.
    pub hiera_config: Option<String>,
    /// The convergence command as sent (before sudo wrapping).
    pub command: String,
    /// Non-zero exits tolerated because `ignore_exit_codes` is set.
    pub ignored_failures: Vec<CommandFailure>,
    /// Whether the staging directory was removed.
    pub cleaned: bool,
}

/// What a provisioning run would do, computed without connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionPlan {
    pub staging: StagingLayout,
    pub hiera_config: Option<String>,
    /// Remote target of the standalone manifest directory.
    pub manifest_dir: Option<String>,
    pub module_paths: Vec<String>,
    pub manifest_target: String,
    pub install_agent: bool,
    /// The convergence command as it will be sent.
    pub command: String,
    pub sudo: bool,
    pub clean_staging_dir: bool,
}
