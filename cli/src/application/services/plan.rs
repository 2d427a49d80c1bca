//! Application service: dry run.
//!
//! Computes the remote layout and convergence command a run would use.
//! Only the local filesystem is touched.

use crate::application::ports::{EntryKind, LocalFs};
use crate::application::services::validate::ensure_valid;
use crate::domain::converge::ConvergeCommand;
use crate::domain::{ConfigError, ProvisionPlan, ProvisionerConfig, StagingLayout};

/// Validate `config` and describe the run it would produce.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found by local validation.
pub async fn plan(fs: &impl LocalFs, config: &ProvisionerConfig) -> Result<ProvisionPlan, ConfigError> {
    ensure_valid(fs, config).await?;

    let staging = StagingLayout::new(&config.staging_dir);
    let hiera_config = config.hiera_config_path.as_ref().map(|_| staging.hiera_config());
    let module_paths: Vec<String> = (0..config.module_paths.len())
        .map(|i| staging.module(i))
        .collect();

    let is_dir = matches!(fs.stat(&config.manifest_file).await, Ok(EntryKind::Directory));
    let manifest_target = staging
        .manifest_target(&config.manifest_file, is_dir)
        .ok_or_else(|| ConfigError::ManifestFileInvalid {
            path: config.manifest_file.clone(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "manifest path has no file name",
            ),
        })?;

    let command = ConvergeCommand::for_config(
        config,
        &module_paths,
        hiera_config.as_deref(),
        &manifest_target,
    )
    .render();

    Ok(ProvisionPlan {
        hiera_config,
        manifest_dir: config.manifest_dir.as_ref().map(|_| staging.manifests()),
        module_paths,
        manifest_target,
        install_agent: config.agent.is_some(),
        command,
        sudo: config.sudo,
        clean_staging_dir: config.clean_staging_dir,
        staging,
    })
}
