//! Installer error taxonomy

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Installer errors
///
/// Every variant is fatal to the run; recoverable conditions (a failed offline
/// attempt) never surface as an `InstallerError`.
#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("Platform {0} not supported.")]
    UnsupportedPlatform(String),

    #[error("{0}")]
    Config(String),

    #[error("Failed to execute `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Could not download {url} ({reason})")]
    Download { url: String, reason: String },

    #[error("Could not extract {} ({source})", archive.display())]
    Extract {
        archive: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Could not install module: {package}.")]
    PackageInstall { package: String, output: String },

    #[error("Could not create virtualenv: {}", .0.display())]
    Virtualenv(PathBuf),

    #[error("Could not install pip: {0}")]
    PipInstall(String),

    #[error("{0}")]
    PythonDev(String),

    #[error("{package} is already installed. Use the --upgrade flag to upgrade.")]
    AlreadyInstalled { package: String },
}

impl InstallerError {
    /// Process exit status for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallerError::Config(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T, E = InstallerError> = std::result::Result<T, E>;
