//! Application service: local path validation.
//!
//! Runs before any remote call. Every check is independent; all of them are
//! computed and the caller decides whether to surface one or all.

use std::io;
use std::path::Path;

use crate::application::ports::{EntryKind, LocalFs};
use crate::domain::{ConfigError, ProvisionerConfig};

/// Check every user-supplied local path and return all problems found,
/// in config order: hiera config, manifest dir, module paths, manifest.
pub async fn validate_paths(fs: &impl LocalFs, config: &ProvisionerConfig) -> Vec<ConfigError> {
    let mut errors = Vec::new();

    if let Some(path) = &config.hiera_config_path {
        match fs.stat(path).await {
            Err(source) => errors.push(ConfigError::HieraConfigInvalid {
                path: path.clone(),
                source,
            }),
            Ok(EntryKind::File) => {}
            Ok(_) => errors.push(ConfigError::HieraConfigNotFile { path: path.clone() }),
        }
    }

    if let Some(path) = &config.manifest_dir {
        if let Some(err) = check_dir(fs, path).await.err() {
            errors.push(match err {
                DirCheck::Missing(source) => ConfigError::ManifestDirInvalid {
                    path: path.clone(),
                    source,
                },
                DirCheck::NotDirectory => ConfigError::ManifestDirNotDirectory { path: path.clone() },
            });
        }
    }

    for (index, path) in config.module_paths.iter().enumerate() {
        if let Some(err) = check_dir(fs, path).await.err() {
            errors.push(match err {
                DirCheck::Missing(source) => ConfigError::ModulePathInvalid {
                    index,
                    path: path.clone(),
                    source,
                },
                DirCheck::NotDirectory => ConfigError::ModulePathNotDirectory {
                    index,
                    path: path.clone(),
                },
            });
        }
    }

    if let Err(source) = fs.stat(&config.manifest_file).await {
        errors.push(ConfigError::ManifestFileInvalid {
            path: config.manifest_file.clone(),
            source,
        });
    }

    errors
}

/// Validate and return the first problem, if any.
///
/// # Errors
///
/// Returns the first [`ConfigError`] reported by [`validate_paths`].
pub async fn ensure_valid(fs: &impl LocalFs, config: &ProvisionerConfig) -> Result<(), ConfigError> {
    match validate_paths(fs, config).await.into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

enum DirCheck {
    Missing(io::Error),
    NotDirectory,
}

async fn check_dir(fs: &impl LocalFs, path: &Path) -> Result<(), DirCheck> {
    match fs.stat(path).await {
        Ok(EntryKind::Directory) => Ok(()),
        Ok(_) => Err(DirCheck::NotDirectory),
        Err(e) => Err(DirCheck::Missing(e)),
    }
}
