//! Command implementations

pub mod apply;
pub mod plan;
pub mod validate;
pub mod version;

use crate::domain::{ConfigError, ProvisionError};

/// Process exit code for a failed command.
///
/// - `2` configuration could not be loaded or is invalid
/// - `3` the host converged cleanly but the staging directory was not removed
/// - `1` anything else
#[must_use]
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<ConfigError>().is_some() {
        return 2;
    }
    match err.downcast_ref::<ProvisionError>() {
        Some(ProvisionError::Config(_)) => 2,
        Some(e) if e.converged() => 3,
        _ => 1,
    }
}

/// Machine-readable error code used in `--json` error objects.
#[must_use]
pub fn error_code(err: &anyhow::Error) -> &'static str {
    match exit_code(err) {
        2 => "CONFIG_INVALID",
        3 => "CLEANUP_FAILED",
        _ if err.downcast_ref::<ProvisionError>().is_some() => "PROVISION_FAILED",
        _ => "ERROR",
    }
}

/// `true` when the command already wrote its own `--json` document for
/// this failure, so the binary must not print an error object after it.
#[must_use]
pub fn already_reported(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Invalid { .. }))
}
