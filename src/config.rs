//! Installer settings file
//!
//! Everything here has a built-in default; a TOML file can override any
//! subset. Command-line flags take precedence over both.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{InstallerError, Result};

/// Settings loaded from `config.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Package installed when no source is given
    pub package: String,
    /// Base URL hosting get-pip.py and the PyCrypto installers
    pub components_url: String,
    /// Archive URL template for `--use-branch`; `{user}` and `{branch}` are substituted
    pub branch_archive_url: String,
    /// GitHub user assumed when `--use-branch` names only a branch
    pub default_branch_user: String,
    /// Wheel directory checked for offline installs
    pub wheels_path: PathBuf,
    pub download_timeout_secs: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            package: "cloudify".to_string(),
            components_url: "http://repository.cloudifysource.org/org/cloudify3/components"
                .to_string(),
            branch_archive_url: "https://github.com/{user}/cloudify-cli/archive/{branch}.tar.gz"
                .to_string(),
            default_branch_user: "cloudify-cosmo".to_string(),
            wheels_path: PathBuf::from("wheelhouse"),
            download_timeout_secs: 300,
        }
    }
}

impl BootstrapConfig {
    /// Load settings
    ///
    /// An explicit path must exist. Without one, the per-user file
    /// (`<config dir>/get-cloudify/config.toml`) is read when present.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("get-cloudify").join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            InstallerError::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents).map_err(|e| {
            InstallerError::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// Source archive URL for a branch spec (`branch` or `user/branch`)
    pub fn branch_source_url(&self, spec: &str) -> Result<String> {
        let (user, branch) = match spec.split('/').collect::<Vec<_>>().as_slice() {
            [branch] => (self.default_branch_user.as_str(), *branch),
            [user, branch] => (*user, *branch),
            _ => {
                return Err(InstallerError::Config(
                    "--use-branch should be specified either as <branch> or as \
                     <user>/<branch>. Too many \"/\" found in arguments."
                        .to_string(),
                ));
            }
        };
        Ok(self
            .branch_archive_url
            .replace("{user}", user)
            .replace("{branch}", branch))
    }
}
