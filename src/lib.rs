//! Bootstrap installer for the Cloudify CLI
//!
//! Detects the host, optionally provisions a virtualenv and installs the
//! package from local wheels, the package index or a source archive.

pub mod cli;
pub mod config;
pub mod error;
pub mod install;
pub mod logging;
pub mod process;

pub use error::{InstallerError, Result};
pub use install::{InstallOptions, InstallOutcome, Installer};
pub use logging::Logger;
pub use process::{Command, CommandRunner, ProcessResult, ProcessRunner};
