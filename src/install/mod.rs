//! Bootstrap installation
//!
//! [`Installer`] runs the whole sequence: prerequisites, virtualenv,
//! requirement files and finally the [`InstallStrategy`] that installs the
//! package itself. Every external command goes through a
//! [`CommandRunner`], so the sequence can be driven by a scripted runner in
//! tests.

mod detection;
mod download;
mod environment;
mod platform;
mod prerequisites;
mod privilege;
mod requirements;
mod runners;
mod strategy;
mod virtualenv;

use std::path::PathBuf;
use std::time::Duration;

pub use detection::{handle_upgrade, import_check_command, is_package_installed, locate_python};
pub use download::{download_file, extract_named_files};
pub use environment::active_virtualenv;
pub use platform::{OsInfo, Platform, is_arch, parse_os_release};
pub use prerequisites::{PythonDevAction, Prerequisites, pycrypto_installer_url, pythondev_action};
pub use privilege::drop_root_privileges;
pub use requirements::{
    REQUIREMENT_FILE_NAMES, RequirementsResolver, RequirementsSpec, ResolvedRequirements,
    existing_requirement_files,
};
pub use runners::run_install;
pub use strategy::{InstallMode, InstallOutcome, InstallPlan, InstallRequest, InstallStrategy};
pub use virtualenv::{
    activation_command, env_bin_path, env_executable, has_activation_script, make_virtualenv,
};

use crate::error::Result;
use crate::logging::Logger;
use crate::process::CommandRunner;

/// Fully resolved installation settings
///
/// Built from the command line and the settings file; the installer does not
/// validate flag combinations again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOptions {
    pub package: String,
    pub version: Option<String>,
    pub pre: bool,
    /// Local path or URL installed instead of `package`
    pub source: Option<String>,
    pub force_online: bool,
    pub wheels_path: PathBuf,
    /// Install every prerequisite
    pub force: bool,
    pub virtualenv: Option<PathBuf>,
    pub python_path: String,
    pub install_pip: bool,
    pub install_virtualenv: bool,
    pub requirements: RequirementsSpec,
    pub upgrade: bool,
    pub install_pythondev: bool,
    pub install_pycrypto: bool,
    pub components_url: String,
    pub download_timeout: Duration,
}

impl InstallOptions {
    /// Defaults for installing `package` on `platform`
    pub fn new(package: impl Into<String>, platform: Platform) -> Self {
        Self {
            package: package.into(),
            version: None,
            pre: false,
            source: None,
            force_online: false,
            wheels_path: PathBuf::from("wheelhouse"),
            force: false,
            virtualenv: None,
            python_path: platform.default_python_path().to_string(),
            install_pip: false,
            install_virtualenv: false,
            requirements: RequirementsSpec::None,
            upgrade: false,
            install_pythondev: false,
            install_pycrypto: false,
            components_url: String::new(),
            download_timeout: Duration::from_secs(300),
        }
    }

    /// What gets handed to pip: the source when given, the package name otherwise
    pub fn target(&self) -> &str {
        self.source.as_deref().unwrap_or(&self.package)
    }
}

pub struct Installer<'a> {
    options: InstallOptions,
    os: OsInfo,
    runner: &'a dyn CommandRunner,
    logger: Logger,
    active_virtualenv: Option<PathBuf>,
}

impl<'a> Installer<'a> {
    pub fn new(
        options: InstallOptions,
        os: OsInfo,
        runner: &'a dyn CommandRunner,
        logger: Logger,
    ) -> Self {
        if options.install_pycrypto && !os.platform.is_windows() {
            logger.warn("Pycrypto only relevant on Windows.");
        }
        if options.install_pythondev && !(os.platform.is_linux() || os.platform.is_darwin()) {
            logger.warn("Pythondev only relevant on Linux or OSx.");
        }
        Self {
            options,
            os,
            runner,
            logger,
            active_virtualenv: active_virtualenv(),
        }
    }

    /// Override the virtualenv the installer is considered to run in
    pub fn with_active_virtualenv(mut self, env: Option<PathBuf>) -> Self {
        self.active_virtualenv = env;
        self
    }

    pub fn options(&self) -> &InstallOptions {
        &self.options
    }

    /// Run the installation sequence
    ///
    /// `--force` turns on every prerequisite step that applies to the host.
    /// When a wheel directory exists it is tried first unless online mode is
    /// forced; a failed offline attempt falls back to the package index once.
    pub fn execute(&self) -> Result<InstallOutcome> {
        let opts = &self.options;
        let platform = self.os.platform;

        self.logger.debug(format!("Identified Platform: {platform}"));
        self.logger
            .debug(format!("Identified Distribution: {}", self.os.distro));
        self.logger
            .debug(format!("Identified Release: {}", self.os.release));

        let strategy = InstallStrategy::new(self.runner, self.logger.clone(), platform)
            .with_active_virtualenv(self.active_virtualenv.clone());
        let prerequisites = Prerequisites::new(
            self.runner,
            self.logger.clone(),
            &self.os,
            &opts.python_path,
            &opts.components_url,
            opts.download_timeout,
        );

        if opts.force || opts.install_pip {
            prerequisites.install_pip()?;
        }

        if opts.virtualenv.is_some() && (opts.force || opts.install_virtualenv) {
            self.install_virtualenv_tool(&strategy)?;
        }

        if platform.is_linux() && (opts.force || opts.install_pythondev) {
            prerequisites.install_pythondev()?;
        }

        // Files created in the environment must belong to the invoking user.
        if (opts.virtualenv.is_some() || self.active_virtualenv.is_some()) && !platform.is_windows()
        {
            drop_root_privileges(&self.logger)?;
        }

        if let Some(env) = &opts.virtualenv
            && !has_activation_script(env, platform)
        {
            make_virtualenv(self.runner, &self.logger, env, &opts.python_path)?;
        }

        if platform.is_windows() && (opts.force || opts.install_pycrypto) {
            prerequisites.install_pycrypto(opts.virtualenv.as_deref())?;
        }

        // Held until the install finishes: archive-extracted files live in its temp dir.
        let requirements = RequirementsResolver::new(&self.logger, opts.download_timeout)
            .resolve(&opts.requirements, opts.source.as_deref())?;

        let plan = InstallPlan {
            package: opts.target().to_string(),
            version: opts.version.clone(),
            pre: opts.pre,
            wheels_path: opts.wheels_path.clone(),
            force_online: opts.force_online,
            requirement_files: requirements.files().to_vec(),
            virtualenv: opts.virtualenv.clone(),
            upgrade: opts.upgrade,
        };
        let outcome = strategy.install(&plan)?;

        if let Some(env) = &opts.virtualenv {
            self.logger.info(format!(
                "You can now run: \"{}\" to activate the Virtualenv.",
                activation_command(env, platform)
            ));
        }
        Ok(outcome)
    }

    fn install_virtualenv_tool(&self, strategy: &InstallStrategy<'_>) -> Result<()> {
        let import_check = import_check_command(
            "virtualenv",
            None,
            &self.options.python_path,
            self.os.platform,
        );
        if is_package_installed(self.runner, &self.logger, &import_check) {
            self.logger
                .info("virtualenv is already installed in the path.");
            return Ok(());
        }
        self.logger.info("Installing virtualenv...");
        strategy.install_module(&InstallRequest::new("virtualenv"))
    }
}
