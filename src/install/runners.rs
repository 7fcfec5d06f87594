//! Top-level runner used by the `get-cloudify` binary
//!
//! Resolves the command line against the host and the settings file, guards
//! against re-installing over an existing installation, then hands over to
//! [`Installer`].

use anyhow::{Context, Result};

use super::detection::{handle_upgrade, import_check_command, locate_python};
use super::platform::{OsInfo, Platform};
use super::strategy::InstallOutcome;
use super::Installer;
use crate::cli::Cli;
use crate::config::BootstrapConfig;
use crate::logging::Logger;
use crate::process::ProcessRunner;

/// Run a complete installation for the parsed command line
pub fn run_install(cli: Cli, logger: &Logger) -> Result<InstallOutcome> {
    let platform = Platform::detect()?;

    let config = BootstrapConfig::load(cli.config.as_deref())?;
    let options = cli.into_options(&config, platform, logger)?;
    let os = OsInfo::detect().context("Failed to identify the host distribution")?;

    match locate_python(&options.python_path) {
        Some(python) => logger.debug(format!("Using Python interpreter {}", python.display())),
        None => logger.warn(format!(
            "Python interpreter {} was not found; steps that need it will fail.",
            options.python_path
        )),
    }

    let runner = ProcessRunner::new(logger.clone());

    let import_check = import_check_command(
        &options.package,
        options.virtualenv.as_deref(),
        &options.python_path,
        platform,
    );
    handle_upgrade(&runner, logger, &options.package, options.upgrade, &import_check)?;

    let package = options.target().to_string();
    let outcome = Installer::new(options, os, &runner, logger.clone())
        .execute()
        .with_context(|| format!("Failed to install {package}"))?;

    match outcome {
        InstallOutcome::Offline => logger.info("Installed from local wheels."),
        InstallOutcome::OnlineAfterFallback => {
            logger.info("Installed from the package index after the offline attempt failed.")
        }
        InstallOutcome::Online => logger.debug("Installed from the package index."),
    }
    Ok(outcome)
}
