//! `masterless apply`: stage artifacts on the host and converge it.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::ProgressReporter;
use crate::application::services::provision::{check_connection, run_phases};
use crate::application::services::validate::ensure_valid;
use crate::domain::{ConnectionOverrides, ProvisionerConfig};
use crate::infra::Transport;
use crate::output::json;

/// Arguments for the apply command.
#[derive(Args, Debug, Default)]
pub struct ApplyArgs {
    /// Target host, overriding `connection` in the config file
    #[arg(long, conflicts_with = "local")]
    pub host: Option<String>,

    /// SSH user
    #[arg(long, conflicts_with = "local")]
    pub user: Option<String>,

    /// SSH port
    #[arg(long, conflicts_with = "local")]
    pub port: Option<u16>,

    /// SSH private key
    #[arg(long, short = 'i', conflicts_with = "local")]
    pub identity: Option<PathBuf>,

    /// Provision this machine instead of a remote host
    #[arg(long)]
    pub local: bool,
}

impl ApplyArgs {
    fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            host: self.host.clone(),
            user: self.user.clone(),
            port: self.port,
            identity_file: self.identity.clone(),
            local: self.local,
        }
    }
}

/// Run `masterless apply`.
///
/// # Errors
///
/// Returns a [`crate::domain::ConfigError`] before connecting if the config
/// is invalid, otherwise the [`crate::domain::ProvisionError`] of the phase that failed.
pub async fn run(args: &ApplyArgs, app: &AppContext) -> Result<()> {
    let raw = app.load_raw_config()?;
    let connection = args.overrides().apply(raw.connection.clone())?;
    let config = ProvisionerConfig::resolve(raw)?;
    ensure_valid(&app.fs, &config).await?;

    let transport = Transport::from_config(&connection);
    let target = transport.describe();
    let reporter = app.terminal_reporter();
    tracing::info!(%target, staging = %config.staging_dir, "starting provisioning run");

    reporter.step(&format!("connecting to {target}..."));
    check_connection(&transport, &reporter).await?;

    let report = run_phases(&transport, &app.fs, &reporter, &config).await?;
    tracing::info!(%target, cleaned = report.cleaned, "provisioning run finished");

    if app.is_json() {
        json::print(&report)
    } else {
        app.renderer().render_report(&target, &report);
        Ok(())
    }
}
