//! Human-readable terminal renderer.

use crate::domain::{ProvisionPlan, ProvisionReport, shell};
use crate::output::OutputContext;

/// Renders domain types as human-readable terminal output using `OutputContext`.
pub struct HumanRenderer<'a> {
    ctx: &'a OutputContext,
}

impl<'a> HumanRenderer<'a> {
    /// Create a new `HumanRenderer` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx }
    }

    /// Render the CLI version information.
    pub fn render_version(&self, version: &str) {
        self.ctx.info(&format!("masterless v{version}"));
    }

    /// Render a dry-run plan.
    pub fn render_plan(&self, plan: &ProvisionPlan) {
        self.ctx.header("Staging:");
        self.ctx.kv("directory:", plan.staging.root());
        if let Some(hiera) = &plan.hiera_config {
            self.ctx.kv("hiera config:", hiera);
        }
        if let Some(dir) = &plan.manifest_dir {
            self.ctx.kv("manifest dir:", dir);
        }
        for (index, module) in plan.module_paths.iter().enumerate() {
            self.ctx.kv(&format!("module {index}:"), module);
        }
        self.ctx.kv("manifest:", &plan.manifest_target);
        self.ctx.kv("install agent:", yes_no(plan.install_agent));
        self.ctx.kv("cleanup:", yes_no(plan.clean_staging_dir));

        if !self.ctx.quiet {
            println!();
        }
        self.ctx.header("Command:");
        let command = if plan.sudo {
            shell::escalate(&plan.command)
        } else {
            plan.command.clone()
        };
        if !self.ctx.quiet {
            println!("  {command}");
        }
    }

    /// Render the summary of a finished run.
    pub fn render_report(&self, target: &str, report: &ProvisionReport) {
        for failure in &report.ignored_failures {
            self.ctx
                .warn(&format!("ignored exit status {} from: {}", failure.status, failure.command));
        }
        if report.cleaned {
            self.ctx
                .info(&format!("removed staging directory {}", report.staging.root()));
        } else {
            self.ctx
                .info(&format!("staged files left in {}", report.staging.root()));
        }
        self.ctx.success(&format!("{target} converged"));
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
