//! Application service: the provisioning run.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.
//!
//! Phases run strictly in order and each one is a hard gate:
//! stage, hiera config, manifest dir, modules, manifest, agent, converge,
//! cleanup. The first failure ends the run.

use std::path::Path;

use crate::application::ports::{EntryKind, LocalFs, ProgressReporter, RemoteTransport};
use crate::application::services::agent::install_agent;
use crate::application::services::remote_exec::{ExitPolicy, run_command, run_in_phase};
use crate::application::services::transfer::{
    create_remote_dir, remove_remote_dir, upload_dir, upload_file,
};
use crate::application::services::validate::ensure_valid;
use crate::domain::converge::ConvergeCommand;
use crate::domain::{
    Phase, ProvisionError, ProvisionReport, ProvisionerConfig, StagingLayout, TransferError,
};

fn in_phase(phase: Phase) -> impl FnOnce(TransferError) -> ProvisionError {
    move |source| ProvisionError::Transfer { phase, source }
}

/// Validate local inputs, then stage them on the host and converge it.
///
/// # Errors
///
/// Returns [`ProvisionError::Config`] before any remote call if a local path
/// is invalid, otherwise the error of the first phase that failed.
/// [`ProvisionError::Cleanup`] means convergence completed.
pub async fn provision(
    transport: &impl RemoteTransport,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &ProvisionerConfig,
) -> Result<ProvisionReport, ProvisionError> {
    ensure_valid(fs, config).await?;
    run_phases(transport, fs, reporter, config).await
}

/// Run a no-op command to prove the host is reachable before staging.
///
/// # Errors
///
/// Returns an error attributed to [`Phase::Stage`] if the command cannot
/// run or exits non-zero.
pub async fn check_connection(
    transport: &impl RemoteTransport,
    reporter: &impl ProgressReporter,
) -> Result<(), ProvisionError> {
    run_command(transport, reporter, "true", false)
        .await
        .map_err(|e| ProvisionError::from_exec(Phase::Stage, e))
}

/// Run every remote phase without the local validation pass.
///
/// # Errors
///
/// Returns the error of the first phase that failed.
pub async fn run_phases(
    transport: &impl RemoteTransport,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    config: &ProvisionerConfig,
) -> Result<ProvisionReport, ProvisionError> {
    let layout = StagingLayout::new(&config.staging_dir);
    let policy = ExitPolicy {
        sudo: config.sudo,
        ignore_exit_codes: config.ignore_exit_codes,
    };
    let mut ignored = Vec::new();

    reporter.step("provisioning with puppet...");

    // 1. Stage
    reporter.step("creating puppet staging directory...");
    create_remote_dir(transport, reporter, layout.root())
        .await
        .map_err(in_phase(Phase::Stage))?;

    // 2. Shared hiera config
    let hiera_config = match &config.hiera_config_path {
        Some(local) => {
            reporter.step("uploading hiera configuration...");
            let remote = layout.hiera_config();
            upload_file(transport, fs, local, &remote)
                .await
                .map_err(in_phase(Phase::SharedConfig))?;
            Some(remote)
        }
        None => None,
    };

    // 3. Standalone manifest directory
    if let Some(dir) = &config.manifest_dir {
        reporter.step(&format!("uploading manifest directory from: {}", dir.display()));
        upload_dir(transport, reporter, dir, &layout.manifests())
            .await
            .map_err(in_phase(Phase::ManifestDir))?;
    }

    // 4. Modules, in declaration order
    let mut module_paths = Vec::with_capacity(config.module_paths.len());
    for (index, local) in config.module_paths.iter().enumerate() {
        reporter.step(&format!("uploading local modules from: {}", local.display()));
        let target = layout.module(index);
        upload_dir(transport, reporter, local, &target)
            .await
            .map_err(in_phase(Phase::Modules))?;
        module_paths.push(target);
    }

    // 5. Manifest file or directory
    let manifest_target = upload_manifest(transport, fs, reporter, &layout, &config.manifest_file)
        .await
        .map_err(in_phase(Phase::Manifest))?;

    // Agent bootstrap
    if let Some(agent) = &config.agent {
        install_agent(
            transport,
            reporter,
            agent,
            &layout,
            &config.puppet_bin_dir,
            policy,
            &mut ignored,
        )
        .await?;
    }

    // 6-7. Facts and convergence
    let command = ConvergeCommand::for_config(
        config,
        &module_paths,
        hiera_config.as_deref(),
        &manifest_target,
    )
    .render();
    reporter.step("running puppet...");
    run_in_phase(transport, reporter, &command, Phase::Converge, policy, &mut ignored).await?;

    let mut report = ProvisionReport {
        staging: layout,
        module_paths,
        manifest_target,
        hiera_config,
        command,
        ignored_failures: ignored,
        cleaned: false,
    };

    // 8. Cleanup
    if config.clean_staging_dir {
        reporter.step("removing puppet staging directory...");
        if let Err(source) =
            remove_remote_dir(transport, reporter, report.staging.root(), config.sudo).await
        {
            return Err(ProvisionError::Cleanup {
                report: Box::new(report),
                source,
            });
        }
        report.cleaned = true;
    }

    Ok(report)
}

/// Upload the configured manifest and return the remote path puppet should apply.
///
/// A directory is uploaded whole to `<staging>/manifests`; a file lands at
/// `<staging>/manifests/<file name>`.
async fn upload_manifest(
    transport: &impl RemoteTransport,
    fs: &impl LocalFs,
    reporter: &impl ProgressReporter,
    layout: &StagingLayout,
    manifest: &Path,
) -> Result<String, TransferError> {
    reporter.step("uploading manifests...");
    let remote_dir = layout.manifests();
    create_remote_dir(transport, reporter, &remote_dir).await?;

    let kind = fs
        .stat(manifest)
        .await
        .map_err(|source| TransferError::Inspect {
            path: manifest.to_path_buf(),
            source,
        })?;

    let is_dir = kind == EntryKind::Directory;
    let target = layout
        .manifest_target(manifest, is_dir)
        .ok_or_else(|| TransferError::Inspect {
            path: manifest.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "manifest path has no file name",
            ),
        })?;

    if is_dir {
        reporter.step(&format!("uploading manifest directory from: {}", manifest.display()));
        upload_dir(transport, reporter, manifest, &remote_dir).await?;
    } else {
        reporter.step(&format!("uploading manifest file from: {}", manifest.display()));
        upload_file(transport, fs, manifest, &target).await?;
    }
    Ok(target)
}
