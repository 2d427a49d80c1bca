//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod converge;
pub mod error;
pub mod provision;
pub mod shell;
pub mod staging;

pub use config::{
    ConnectionConfig, ConnectionOverrides, ProvisionerConfig, RawProvisionerConfig, SshConnection,
};
pub use error::{
    CommandFailure, ConfigError, ExecError, Phase, ProvisionError, TransferError,
};
pub use provision::{ExitOutcome, ProvisionPlan, ProvisionReport};
pub use staging::StagingLayout;
