//! Domain types for the provisioner configuration.
//!
//! Pure functions only, no I/O.
//! `RawProvisionerConfig` mirrors the YAML file; `ProvisionerConfig` is the
//! resolved, immutable value every service works from.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::staging::DEFAULT_STAGING_DIR;

// ── Constants ────────────────────────────────────────────────────────────────

/// Directory holding the `puppet` binary on hosts using the official packages.
pub const DEFAULT_PUPPET_BIN_DIR: &str = "/opt/puppetlabs/bin";

/// Installer script used when `install_agent` is enabled without a URL.
pub const DEFAULT_AGENT_INSTALLER_URL: &str =
    "https://raw.githubusercontent.com/pyToshka/puppet-install-shell/master/install_puppet_agent.sh";

// ── Config schema ────────────────────────────────────────────────────────────

/// Provisioner configuration as written in the YAML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawProvisionerConfig {
    /// External facts exposed to the convergence run as `FACTER_<name>`.
    #[serde(alias = "facter", deserialize_with = "scalar_map")]
    pub facts: BTreeMap<String, String>,
    /// Local hiera config uploaded to `<staging>/hiera.yaml`.
    pub hiera_config_path: Option<PathBuf>,
    /// Local module directories, in search-path order.
    pub module_paths: Vec<PathBuf>,
    /// Local manifest file or directory passed to `puppet apply`.
    pub manifest_file: Option<PathBuf>,
    /// Extra manifest directory uploaded to `<staging>/manifests`.
    pub manifest_dir: Option<PathBuf>,
    /// Run privileged commands through `sudo`.
    pub sudo: bool,
    pub staging_directory: Option<String>,
    pub working_directory: Option<String>,
    pub clean_staging_directory: bool,
    /// Report non-zero exits from puppet and the agent installer without failing.
    pub ignore_exit_codes: bool,
    pub puppet_bin_dir: Option<String>,
    /// Appended verbatim (quoted) to the `puppet apply` command line.
    pub extra_arguments: Vec<String>,
    pub install_agent: bool,
    pub agent_installer_url: Option<String>,
    /// How to reach the host.
    pub connection: Option<ConnectionConfig>,
}

/// Connection settings for the target host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ConnectionConfig {
    /// Reach the host with the system OpenSSH client.
    Ssh(SshConnection),
    /// Provision the machine the CLI runs on.
    Local,
}

/// OpenSSH connection parameters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SshConnection {
    pub host: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
    /// Extra `-o` options, e.g. `StrictHostKeyChecking=accept-new`.
    #[serde(default)]
    pub options: Vec<String>,
}

/// Accept any YAML scalar as a fact value; facts are always strings on the wire.
fn scalar_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as _;

    let raw: Option<BTreeMap<String, serde_yaml::Value>> = Option::deserialize(deserializer)?;
    let mut out = BTreeMap::new();
    for (key, value) in raw.unwrap_or_default() {
        let text = match value {
            serde_yaml::Value::String(s) => s,
            serde_yaml::Value::Number(n) => n.to_string(),
            serde_yaml::Value::Bool(b) => b.to_string(),
            serde_yaml::Value::Null => String::new(),
            _ => {
                return Err(D::Error::custom(format!(
                    "fact '{key}' must be a string, number, or boolean"
                )));
            }
        };
        out.insert(key, text);
    }
    Ok(out)
}

// ── Connection overrides ─────────────────────────────────────────────────────

/// Connection settings given on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionOverrides {
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<PathBuf>,
    pub local: bool,
}

impl ConnectionOverrides {
    /// Merge the overrides onto the connection from the config file.
    ///
    /// `local` wins outright. A `host` replaces the configured target and
    /// keeps its `options`. `user`, `port` and `identity_file` patch an ssh
    /// connection field by field.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingConnection`] when neither side names a
    /// target.
    pub fn apply(self, configured: Option<ConnectionConfig>) -> Result<ConnectionConfig, ConfigError> {
        if self.local {
            return Ok(ConnectionConfig::Local);
        }
        let base = match (self.host, configured) {
            (Some(host), Some(ConnectionConfig::Ssh(ssh))) => SshConnection { host, ..ssh },
            (Some(host), _) => SshConnection {
                host,
                ..SshConnection::default()
            },
            (None, Some(ConnectionConfig::Ssh(ssh))) => ssh,
            (None, Some(ConnectionConfig::Local)) => return Ok(ConnectionConfig::Local),
            (None, None) => return Err(ConfigError::MissingConnection),
        };
        Ok(ConnectionConfig::Ssh(SshConnection {
            user: self.user.or(base.user),
            port: self.port.or(base.port),
            identity_file: self.identity_file.or(base.identity_file),
            ..base
        }))
    }
}

// ── Resolved config ──────────────────────────────────────────────────────────

/// Agent bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentInstall {
    pub installer_url: String,
}

/// Fully-resolved provisioner configuration. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionerConfig {
    /// Sorted so rendered commands are reproducible.
    pub facts: BTreeMap<String, String>,
    pub hiera_config_path: Option<PathBuf>,
    pub module_paths: Vec<PathBuf>,
    pub manifest_file: PathBuf,
    pub manifest_dir: Option<PathBuf>,
    pub sudo: bool,
    pub staging_dir: String,
    pub working_dir: String,
    pub clean_staging_dir: bool,
    pub ignore_exit_codes: bool,
    pub puppet_bin_dir: String,
    pub extra_arguments: Vec<String>,
    pub agent: Option<AgentInstall>,
}

impl ProvisionerConfig {
    /// Apply defaults to a raw config.
    ///
    /// - empty or missing `staging_directory` becomes [`DEFAULT_STAGING_DIR`]
    /// - missing `working_directory` becomes the staging directory
    /// - empty path options are treated as unset
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing, the staging directory is
    /// blank, or a fact name is not a valid environment variable suffix.
    pub fn resolve(raw: RawProvisionerConfig) -> Result<Self, ConfigError> {
        let manifest_file = non_empty_path(raw.manifest_file).ok_or(ConfigError::MissingManifest)?;

        let staging_dir = match raw.staging_directory {
            None => DEFAULT_STAGING_DIR.to_string(),
            Some(s) if s.is_empty() => DEFAULT_STAGING_DIR.to_string(),
            Some(s) if s.trim().is_empty() => return Err(ConfigError::EmptyStagingDirectory),
            Some(s) => s,
        };
        let working_dir = raw
            .working_directory
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| staging_dir.clone());

        if let Some(bad) = raw.facts.keys().find(|k| !is_fact_name(k)) {
            return Err(ConfigError::InvalidFactName(bad.clone()));
        }

        let agent = raw.install_agent.then(|| AgentInstall {
            installer_url: raw
                .agent_installer_url
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| DEFAULT_AGENT_INSTALLER_URL.to_string()),
        });

        Ok(Self {
            facts: raw.facts,
            hiera_config_path: non_empty_path(raw.hiera_config_path),
            module_paths: raw.module_paths,
            manifest_file,
            manifest_dir: non_empty_path(raw.manifest_dir),
            sudo: raw.sudo,
            staging_dir,
            working_dir,
            clean_staging_dir: raw.clean_staging_directory,
            ignore_exit_codes: raw.ignore_exit_codes,
            puppet_bin_dir: raw
                .puppet_bin_dir
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| DEFAULT_PUPPET_BIN_DIR.to_string()),
            extra_arguments: raw.extra_arguments,
            agent,
        })
    }
}

fn non_empty_path(path: Option<PathBuf>) -> Option<PathBuf> {
    path.filter(|p| !p.as_os_str().is_empty())
}

/// Fact names become part of an environment variable name.
fn is_fact_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ── Unit tests ───────────────────────────────────────────────────────────────
