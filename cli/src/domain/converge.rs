//! Construction of the `puppet apply` command line.

use std::collections::BTreeMap;

use crate::domain::config::ProvisionerConfig;
use crate::domain::shell::{self, ShellCommand};
use crate::domain::staging::module_search_path;

/// Prefix turning a fact name into the environment variable facter reads.
pub const FACT_ENV_PREFIX: &str = "FACTER_";

/// Inputs of the final convergence command.
#[derive(Debug, Clone)]
pub struct ConvergeCommand<'a> {
    pub working_dir: &'a str,
    pub facts: &'a BTreeMap<String, String>,
    pub puppet_bin_dir: &'a str,
    /// Remote module directories in search-path order.
    pub module_paths: &'a [String],
    pub hiera_config: Option<&'a str>,
    pub manifest: &'a str,
    pub extra_arguments: &'a [String],
}

impl<'a> ConvergeCommand<'a> {
    /// Take working dir, facts, bin dir and extra arguments from `config`.
    #[must_use]
    pub fn for_config(
        config: &'a ProvisionerConfig,
        module_paths: &'a [String],
        hiera_config: Option<&'a str>,
        manifest: &'a str,
    ) -> Self {
        Self {
            working_dir: &config.working_dir,
            facts: &config.facts,
            puppet_bin_dir: &config.puppet_bin_dir,
            module_paths,
            hiera_config,
            manifest,
            extra_arguments: &config.extra_arguments,
        }
    }

    /// `cd <wd> && [FACTER_x=..] <bin>/puppet apply --verbose [--modulepath=..] [--hiera_config=..] [extra..] <manifest>`
    #[must_use]
    pub fn render(&self) -> String {
        let program = format!("{}/puppet", self.puppet_bin_dir.trim_end_matches('/'));
        let mut apply = ShellCommand::new(program).arg("apply").arg("--verbose");
        for (name, value) in self.facts {
            apply = apply.env(format!("{FACT_ENV_PREFIX}{name}"), value.as_str());
        }
        if !self.module_paths.is_empty() {
            apply = apply.arg(format!("--modulepath={}", module_search_path(self.module_paths)));
        }
        if let Some(hiera) = self.hiera_config {
            apply = apply.arg(format!("--hiera_config={hiera}"));
        }
        apply = apply
            .args(self.extra_arguments.iter().map(String::as_str))
            .arg(self.manifest);

        let cd = ShellCommand::new("cd").arg(self.working_dir).render();
        shell::and_then(&[cd, apply.render()])
    }
}
