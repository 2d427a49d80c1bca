//! Application service: puppet agent bootstrap.
//!
//! Downloads the installer into the staging directory, runs it, and makes
//! the puppet bin dir visible to login shells.

use crate::application::ports::{ProgressReporter, RemoteTransport};
use crate::application::services::remote_exec::{ExitPolicy, run_in_phase};
use crate::domain::config::AgentInstall;
use crate::domain::shell::{self, ShellCommand};
use crate::domain::{CommandFailure, Phase, ProvisionError, StagingLayout};

/// Profile snippet that puts the puppet bin dir on `PATH`.
pub const PROFILE_SNIPPET: &str = "/etc/profile.d/masterless.sh";

/// Commands run, in order, to install the agent.
#[must_use]
pub fn install_commands(agent: &AgentInstall, layout: &StagingLayout, puppet_bin_dir: &str) -> Vec<String> {
    let installer = layout.agent_installer();
    let export = format!("export PATH={}:\"$PATH\"", shell::quote(puppet_bin_dir));
    let export_quoted = shell::quote(&export);
    let snippet = shell::quote(PROFILE_SNIPPET);
    vec![
        ShellCommand::new("curl")
            .args(["-fsSL", agent.installer_url.as_str(), "-o", installer.as_str()])
            .render(),
        ShellCommand::new("chmod").arg("+x").arg(installer.as_str()).render(),
        ShellCommand::new(installer.as_str()).render(),
        // Append only once so repeated runs leave a single line behind.
        format!("grep -qxF {export_quoted} {snippet} 2>/dev/null || echo {export_quoted} >> {snippet}"),
    ]
}

/// Install the puppet agent on the remote host.
///
/// # Errors
///
/// Returns a [`ProvisionError`] in [`Phase::Agent`] when a step fails and
/// the policy does not ignore it.
pub async fn install_agent(
    transport: &impl RemoteTransport,
    reporter: &impl ProgressReporter,
    agent: &AgentInstall,
    layout: &StagingLayout,
    puppet_bin_dir: &str,
    policy: ExitPolicy,
    ignored: &mut Vec<CommandFailure>,
) -> Result<(), ProvisionError> {
    reporter.step(&format!("installing puppet agent from {}", agent.installer_url));
    for command in install_commands(agent, layout, puppet_bin_dir) {
        run_in_phase(transport, reporter, &command, Phase::Agent, policy, ignored).await?;
    }
    reporter.success("puppet agent installed");
    Ok(())
}
