//! Command-line interface for `get-cloudify`
//!
//! Mutually exclusive options are enforced by clap groups. Deprecated flag
//! spellings are still accepted, hidden from help, and folded into their
//! replacements when [`Cli::into_options`] builds the [`InstallOptions`].

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use crate::config::BootstrapConfig;
use crate::error::{InstallerError, Result};
use crate::install::{InstallOptions, Platform, RequirementsSpec};
use crate::logging::{Logger, Verbosity};

const LONG_ABOUT: &str = "\
Attempts to install Cloudify's CLI on Linux, Windows and OS X.
On Linux, Debian/Ubuntu, CentOS/RHEL and Arch are supported.

The installer does not force prerequisites on you: pip, virtualenv,
python-dev and PyCrypto are only installed when explicitly requested
(or with --force).

Installations go into the system Python, the currently active virtualenv
or a declared virtualenv (--virtualenv). When run from within a
virtualenv without --virtualenv, Cloudify is installed into the active one.";

/// Command-line arguments for get-cloudify
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "get-cloudify", about = "Bootstrap installer for the Cloudify CLI")]
#[command(long_about = LONG_ABOUT)]
#[command(group(ArgGroup::new("verbosity").args(["verbose", "quiet"])))]
#[command(group(ArgGroup::new("target").args(["version", "pre", "source", "use_branch"])))]
#[command(group(
    ArgGroup::new("online").args(["forceonline", "force_online", "wheelspath", "wheels_path"])
))]
pub struct Cli {
    /// Verbose level logging to shell
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Attempt to install a specific version of Cloudify
    #[arg(long, value_name = "VERSION")]
    pub version: Option<String>,

    /// Attempt to install the latest Cloudify milestone
    #[arg(long)]
    pub pre: bool,

    /// Install from the provided URL or local path
    #[arg(short, long)]
    pub source: Option<String>,

    /// Branch to install from, as <branch> or <user>/<branch>
    ///
    /// The user defaults to cloudify-cosmo. You will likely want
    /// --with-requirements when using this.
    #[arg(short = 'b', long, value_name = "BRANCH")]
    pub use_branch: Option<String>,

    #[arg(long, hide = true)]
    pub forceonline: bool,

    /// Even if wheels are found locally, install from PyPI
    #[arg(long)]
    pub force_online: bool,

    #[arg(long, hide = true)]
    pub wheelspath: Option<PathBuf>,

    /// Path to wheels [default: <cwd>/wheelhouse]
    #[arg(long, value_name = "DIR")]
    pub wheels_path: Option<PathBuf>,

    /// Force install any requirements (USE WITH CARE!)
    #[arg(short, long)]
    pub force: bool,

    /// Path to a virtualenv to install Cloudify in
    #[arg(short = 'e', long, value_name = "PATH")]
    pub virtualenv: Option<PathBuf>,

    #[arg(long, hide = true)]
    pub pythonpath: Option<String>,

    /// Python path to use when creating a virtualenv
    #[arg(long, value_name = "PYTHON")]
    pub python_path: Option<String>,

    #[arg(long, hide = true)]
    pub installpip: bool,

    /// Attempt to install pip
    #[arg(long)]
    pub install_pip: bool,

    #[arg(long, hide = true)]
    pub installvirtualenv: bool,

    /// Attempt to install virtualenv
    #[arg(long)]
    pub install_virtualenv: bool,

    #[arg(long, hide = true, num_args = 0..)]
    pub withrequirements: Option<Vec<String>>,

    /// Install the default or the provided requirement files
    #[arg(short = 'r', long, num_args = 0.., value_name = "FILE")]
    pub with_requirements: Option<Vec<String>>,

    /// Upgrade Cloudify if already installed
    #[arg(short, long)]
    pub upgrade: bool,

    #[arg(long, hide = true)]
    pub installpythondev: bool,

    /// Attempt to install the Python development package (Linux)
    #[arg(long)]
    pub install_pythondev: bool,

    #[arg(long, hide = true)]
    pub installpycrypto: bool,

    /// Attempt to install PyCrypto (Windows)
    #[arg(long)]
    pub install_pycrypto: bool,

    /// Package to install instead of the configured one
    #[arg(long, value_name = "NAME")]
    pub package: Option<String>,

    /// Settings file [default: <config dir>/get-cloudify/config.toml]
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Fold deprecated spellings into their replacements
    ///
    /// A deprecated flag that was given overrides the new one. Returns the
    /// `(deprecated, replacement)` pairs that were used.
    pub fn apply_deprecations(&mut self) -> Vec<(&'static str, &'static str)> {
        let mut used = Vec::new();

        if let Some(files) = self.withrequirements.take() {
            self.with_requirements = Some(files);
            used.push(("withrequirements", "with-requirements"));
        }
        if self.installvirtualenv {
            self.install_virtualenv = true;
            used.push(("installvirtualenv", "install-virtualenv"));
        }
        if self.installpip {
            self.install_pip = true;
            used.push(("installpip", "install-pip"));
        }
        if let Some(path) = self.pythonpath.take() {
            self.python_path = Some(path);
            used.push(("pythonpath", "python-path"));
        }
        if let Some(path) = self.wheelspath.take() {
            self.wheels_path = Some(path);
            used.push(("wheelspath", "wheels-path"));
        }
        if self.forceonline {
            self.force_online = true;
            used.push(("forceonline", "force-online"));
        }
        if self.installpycrypto {
            self.install_pycrypto = true;
            used.push(("installpycrypto", "install-pycrypto"));
        }
        if self.installpythondev {
            self.install_pythondev = true;
            used.push(("installpythondev", "install-pythondev"));
        }
        used
    }

    /// Resolve arguments against the settings file into [`InstallOptions`]
    pub fn into_options(
        mut self,
        config: &BootstrapConfig,
        platform: Platform,
        logger: &Logger,
    ) -> Result<InstallOptions> {
        for (deprecated, replacement) in self.apply_deprecations() {
            logger.warn(format!(
                "--{deprecated} is deprecated. Use --{replacement}. \
                 --{deprecated} will be removed in a future release."
            ));
        }

        let requirements = RequirementsSpec::from_flag(self.with_requirements.take());
        if requirements.is_requested() && self.source.is_none() && self.use_branch.is_none() {
            return Err(InstallerError::Config(
                "--source or --use-branch is required when calling with --with-requirements."
                    .to_string(),
            ));
        }

        let source = match self.use_branch.as_deref() {
            Some(branch) => Some(config.branch_source_url(branch)?),
            None => self.source.take(),
        };
        if source.is_some() && !requirements.is_requested() {
            logger.warn(
                "A source URL or branch was specified, but --with-requirements was omitted. \
                 You may need to retry using --with-requirements if the installation fails.",
            );
        }

        Ok(InstallOptions {
            package: self.package.unwrap_or_else(|| config.package.clone()),
            version: self.version,
            pre: self.pre,
            source,
            force_online: self.force_online,
            wheels_path: self
                .wheels_path
                .unwrap_or_else(|| config.wheels_path.clone()),
            force: self.force,
            virtualenv: self.virtualenv,
            python_path: self
                .python_path
                .unwrap_or_else(|| platform.default_python_path().to_string()),
            install_pip: self.install_pip,
            install_virtualenv: self.install_virtualenv,
            requirements,
            upgrade: self.upgrade,
            install_pythondev: self.install_pythondev,
            install_pycrypto: self.install_pycrypto,
            components_url: config.components_url.clone(),
            download_timeout: config.download_timeout(),
        })
    }
}
