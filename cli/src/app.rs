//! Application context: unified state passed to every command handler.
//!
//! Constructed once in `Cli::run()` from the global flags so that command
//! signatures only ever take `&AppContext` plus their own arguments.

use std::path::PathBuf;

use crate::application::ports::ConfigStore;
use crate::domain::{ConfigError, ProvisionerConfig, RawProvisionerConfig};
use crate::infra::{StdFs, YamlConfigStore};
use crate::output::human::HumanRenderer;
use crate::output::{OutputContext, TerminalReporter};

/// Output rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable terminal output (default).
    Human,
    /// Machine-readable JSON output.
    Json,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Enable JSON output mode.
    pub json: bool,
    /// Provisioner config file.
    pub config: PathBuf,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Output rendering mode (human vs JSON).
    pub mode: OutputMode,
    /// Where the provisioner config comes from.
    pub config_store: YamlConfigStore,
    /// Controller filesystem.
    pub fs: StdFs,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: &AppFlags) -> Self {
        let mode = if flags.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        };
        // JSON goes to stdout on its own; progress lines would corrupt it.
        let quiet = flags.quiet || flags.json;

        Self {
            output: OutputContext::new(flags.no_color, quiet),
            mode,
            config_store: YamlConfigStore::new(&flags.config),
            fs: StdFs,
        }
    }

    /// Returns `true` when JSON output mode is active.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    #[must_use]
    pub fn terminal_reporter(&self) -> TerminalReporter<'_> {
        TerminalReporter::new(&self.output)
    }

    #[must_use]
    pub fn renderer(&self) -> HumanRenderer<'_> {
        HumanRenderer::new(&self.output)
    }

    /// Read the raw config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] if the file cannot be read or parsed.
    pub fn load_raw_config(&self) -> Result<RawProvisionerConfig, ConfigError> {
        self.config_store.load().map_err(|source| ConfigError::Load {
            path: self.config_store.path(),
            source: source.into(),
        })
    }

    /// Read the config file and apply defaults.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if loading or resolution fails.
    pub fn load_config(&self) -> Result<ProvisionerConfig, ConfigError> {
        ProvisionerConfig::resolve(self.load_raw_config()?)
    }
}
