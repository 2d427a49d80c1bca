//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;
use crate::infra::config::DEFAULT_CONFIG_FILE;

/// Stage puppet manifests and modules on a host and converge it with `puppet apply`
#[derive(Parser)]
#[command(
    name = "masterless",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Provisioner config file
    #[arg(long, short, global = true, env = "MASTERLESS_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,

    /// Increase diagnostic logging on stderr (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Stage artifacts on the host and run puppet apply
    Apply(commands::apply::ApplyArgs),

    /// Check the config file and local paths without connecting
    Validate,

    /// Show the staging layout and puppet command without connecting
    Plan,

    /// Show version
    Version,
}

impl Cli {
    /// Default `tracing` filter directive for the `-v` count.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Flags shared by every command.
    #[must_use]
    pub fn app_flags(&self) -> AppFlags {
        AppFlags {
            no_color: self.no_color,
            quiet: self.quiet,
            json: self.json,
            config: self.config.clone(),
        }
    }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let app = AppContext::new(&self.app_flags());
        match self.command {
            Command::Apply(args) => commands::apply::run(&args, &app).await,
            Command::Validate => commands::validate::run(&app).await,
            Command::Plan => commands::plan::run(&app).await,
            Command::Version => commands::version::run(&app),
        }
    }
}
