//! Remote staging layout derived from the staging directory.
//!
//! Remote hosts are POSIX; paths here are plain `/`-joined strings, never
//! `std::path::Path`, so a Windows controller still produces remote paths.

use std::path::Path;

use serde::Serialize;

/// Default staging directory on the remote host.
pub const DEFAULT_STAGING_DIR: &str = "/tmp/masterless-provision";

/// Separator between entries of the convergence tool's module search path.
pub const MODULE_PATH_SEPARATOR: &str = ":";

/// Remote paths computed from the staging directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingLayout {
    root: String,
}

impl StagingLayout {
    /// Build a layout rooted at `staging_dir`. Trailing separators are dropped.
    #[must_use]
    pub fn new(staging_dir: &str) -> Self {
        let trimmed = staging_dir.trim_end_matches('/');
        let root = if trimmed.is_empty() && staging_dir.starts_with('/') {
            "/".to_string()
        } else {
            trimmed.to_string()
        };
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    fn join(&self, name: &str) -> String {
        if self.root.ends_with('/') {
            format!("{}{name}", self.root)
        } else {
            format!("{}/{name}", self.root)
        }
    }

    /// `<staging>/manifests`
    #[must_use]
    pub fn manifests(&self) -> String {
        self.join("manifests")
    }

    /// `<staging>/manifests/<file_name>`
    #[must_use]
    pub fn manifest_file(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.manifests())
    }

    /// `<staging>/module-<index>`
    #[must_use]
    pub fn module(&self, index: usize) -> String {
        self.join(&format!("module-{index}"))
    }

    /// `<staging>/hiera.yaml`
    #[must_use]
    pub fn hiera_config(&self) -> String {
        self.join("hiera.yaml")
    }

    /// `<staging>/install_agent.sh`
    #[must_use]
    pub fn agent_installer(&self) -> String {
        self.join("install_agent.sh")
    }

    /// Remote path `puppet apply` is pointed at for the local `manifest`.
    ///
    /// A directory maps to `<staging>/manifests`, a file to
    /// `<staging>/manifests/<file name>`. `None` when a file path has no
    /// final component.
    #[must_use]
    pub fn manifest_target(&self, manifest: &Path, is_dir: bool) -> Option<String> {
        if is_dir {
            return Some(self.manifests());
        }
        manifest
            .file_name()
            .map(|name| self.manifest_file(&name.to_string_lossy()))
    }
}

/// Join remote module directories into a search path, preserving order.
#[must_use]
pub fn module_search_path(paths: &[String]) -> String {
    paths.join(MODULE_PATH_SEPARATOR)
}
