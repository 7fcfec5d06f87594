//! Package installation strategy: offline wheels first, package index second
//!
//! ```text
//!   decide ──(force_online || no wheel dir)──────────────► ONLINE
//!     │                                                      │
//!     └──► OFFLINE_ATTEMPT ──ok──► SUCCESS        ok ◄───────┤
//!               │                                            │
//!               └──fails──(warn)──► ONLINE ──fails──► fatal PackageInstall
//! ```
//!
//! Each attempt is described by its own [`InstallRequest`]; the fallback
//! builds a fresh request instead of editing the offline one.

use std::path::PathBuf;

use super::platform::Platform;
use super::virtualenv::env_executable;
use crate::error::{InstallerError, Result};
use crate::logging::Logger;
use crate::process::{Command, CommandRunner, ProcessResult};

/// One pip invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    pub package: String,
    pub version: Option<String>,
    pub pre: bool,
    /// Local wheel directory; set only for offline attempts
    pub wheels_path: Option<PathBuf>,
    pub requirement_files: Vec<String>,
    pub virtualenv: Option<PathBuf>,
    pub upgrade: bool,
}

impl InstallRequest {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            ..Self::default()
        }
    }

    /// `name==version` when pinned, the bare name otherwise
    pub fn specifier(&self) -> String {
        match &self.version {
            Some(version) => format!("{}=={}", self.package, version),
            None => self.package.clone(),
        }
    }

    /// Build the `pip install` command line for this request
    pub fn to_command(&self, platform: Platform) -> Command {
        let pip = match &self.virtualenv {
            Some(env) => env_executable(env, platform, "pip").display().to_string(),
            None => "pip".to_string(),
        };

        let mut command = Command::new(pip).arg("install");
        for requirement_file in &self.requirement_files {
            command = command.arg("-r").arg(requirement_file.as_str());
        }
        command = command.arg(self.specifier());
        if let Some(wheels_path) = &self.wheels_path {
            command = command
                .arg("--no-index")
                .arg("--find-links")
                .arg(wheels_path.display().to_string());
        }
        if self.pre {
            command = command.arg("--pre");
        }
        if self.upgrade {
            command = command.arg("--upgrade");
        }
        command
    }
}

/// What the caller wants installed, before a mode is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// Package name, or the source path/URL when installing from source
    pub package: String,
    pub version: Option<String>,
    pub pre: bool,
    pub wheels_path: PathBuf,
    pub force_online: bool,
    pub requirement_files: Vec<String>,
    pub virtualenv: Option<PathBuf>,
    pub upgrade: bool,
}

impl InstallPlan {
    pub fn mode(&self) -> InstallMode {
        if self.force_online || !self.wheels_path.is_dir() {
            InstallMode::Online
        } else {
            InstallMode::OfflineAttempt
        }
    }

    /// Offline attempts accept pre-releases and never pin a version
    pub fn offline_request(&self) -> InstallRequest {
        InstallRequest {
            package: self.package.clone(),
            version: None,
            pre: true,
            wheels_path: Some(self.wheels_path.clone()),
            requirement_files: self.requirement_files.clone(),
            virtualenv: self.virtualenv.clone(),
            upgrade: self.upgrade,
        }
    }

    pub fn online_request(&self) -> InstallRequest {
        InstallRequest {
            package: self.package.clone(),
            version: self.version.clone(),
            pre: self.pre,
            wheels_path: None,
            requirement_files: self.requirement_files.clone(),
            virtualenv: self.virtualenv.clone(),
            upgrade: self.upgrade,
        }
    }
}

/// Initial mode picked for a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallMode {
    Online,
    OfflineAttempt,
}

/// How a successful installation was achieved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallOutcome {
    /// Installed from local wheels
    Offline,
    /// Installed from the index without trying wheels
    Online,
    /// Wheels failed, the index install succeeded
    OnlineAfterFallback,
}

/// Runs install plans through a [`CommandRunner`]
pub struct InstallStrategy<'a> {
    runner: &'a dyn CommandRunner,
    logger: Logger,
    platform: Platform,
    active_virtualenv: Option<PathBuf>,
}

impl<'a> InstallStrategy<'a> {
    pub fn new(runner: &'a dyn CommandRunner, logger: Logger, platform: Platform) -> Self {
        Self {
            runner,
            logger,
            platform,
            active_virtualenv: None,
        }
    }

    /// Virtualenv the installer itself runs in; reported when no target env is given
    pub fn with_active_virtualenv(mut self, env: Option<PathBuf>) -> Self {
        self.active_virtualenv = env;
        self
    }

    /// Install according to `plan`, falling back from wheels to the index once
    pub fn install(&self, plan: &InstallPlan) -> Result<InstallOutcome> {
        match plan.mode() {
            InstallMode::Online => {
                self.install_module(&plan.online_request())?;
                Ok(InstallOutcome::Online)
            }
            InstallMode::OfflineAttempt => {
                self.logger.info(format!(
                    "Wheels directory found: \"{}\". Attempting offline installation...",
                    plan.wheels_path.display()
                ));
                match self.try_offline(&plan.offline_request()) {
                    Ok(()) => Ok(InstallOutcome::Offline),
                    Err(reason) => {
                        self.logger
                            .warn(format!("Offline installation failed ({reason})."));
                        self.install_module(&plan.online_request())?;
                        Ok(InstallOutcome::OnlineAfterFallback)
                    }
                }
            }
        }
    }

    /// Run a single request; a non-zero exit is fatal
    pub fn install_module(&self, request: &InstallRequest) -> Result<()> {
        let result = self.execute(request)?;
        if !result.success() {
            self.logger.error(&result.stdout);
            return Err(InstallerError::PackageInstall {
                package: request.specifier(),
                output: result.stdout,
            });
        }
        Ok(())
    }

    /// Offline attempt; every failure is reported back as a reason string
    fn try_offline(&self, request: &InstallRequest) -> Result<(), String> {
        match self.execute(request) {
            Ok(result) if result.success() => Ok(()),
            Ok(result) => {
                self.logger.debug(&result.stdout);
                Err(format!(
                    "{} exited with status {}",
                    request.specifier(),
                    result.status
                ))
            }
            Err(e) => Err(e.to_string()),
        }
    }

    fn execute(&self, request: &InstallRequest) -> Result<ProcessResult> {
        self.logger
            .info(format!("Installing {}...", request.specifier()));
        if request.virtualenv.is_none()
            && let Some(active) = &self.active_virtualenv
        {
            self.logger.info(format!(
                "Installing within current virtualenv: {}...",
                active.display()
            ));
        }
        self.runner.run(&request.to_command(self.platform), false)
    }
}
