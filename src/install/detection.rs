//! Installation state detection
//!
//! Decides whether the target package is already importable by the Python
//! that would receive the install, and enforces the `--upgrade` requirement
//! for re-installs.

use std::path::{Path, PathBuf};

use super::platform::Platform;
use super::virtualenv::env_executable;
use crate::error::{InstallerError, Result};
use crate::logging::Logger;
use crate::process::{Command, CommandRunner};

/// Import check: `<python> -c "import <module>"`
///
/// Uses the virtualenv interpreter when one is given, otherwise `python_path`.
pub fn import_check_command(
    package: &str,
    virtualenv: Option<&Path>,
    python_path: &str,
    platform: Platform,
) -> Command {
    let python = match virtualenv {
        Some(env) => env_executable(env, platform, "python")
            .display()
            .to_string(),
        None => python_path.to_string(),
    };
    Command::new(python).args(["-c".to_string(), format!("import {}", module_name(package))])
}

/// Resolve the interpreter that will run import checks and get-pip.py
///
/// Bare names are looked up on PATH; paths must point at an executable file.
pub fn locate_python(python_path: &str) -> Option<PathBuf> {
    which::which(python_path).ok()
}

/// Distribution names use dashes, import names use underscores
fn module_name(package: &str) -> String {
    package.replace('-', "_")
}

/// Whether `package` imports cleanly; an interpreter that cannot be launched counts as "no"
pub fn is_package_installed(
    runner: &dyn CommandRunner,
    logger: &Logger,
    command: &Command,
) -> bool {
    match runner.run(command, true) {
        Ok(result) => result.success(),
        Err(e) => {
            logger.debug(format!("Installation check failed: {e}"));
            false
        }
    }
}

/// Refuse to reinstall over an existing installation unless upgrading
pub fn handle_upgrade(
    runner: &dyn CommandRunner,
    logger: &Logger,
    package: &str,
    upgrade: bool,
    command: &Command,
) -> Result<()> {
    if !is_package_installed(runner, logger, command) {
        return Ok(());
    }

    logger.info(format!("{package} is already installed in the path."));
    if upgrade {
        logger.info("Upgrading...");
        Ok(())
    } else {
        logger.error("Use the --upgrade flag to upgrade.");
        Err(InstallerError::AlreadyInstalled {
            package: package.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ScriptedRunner;
    use assert_matches::assert_matches;
    use log::Level;

    fn import_check() -> Command {
        import_check_command("cloudify", None, "python", Platform::Linux)
    }

    #[test]
    fn import_check_uses_virtualenv_interpreter() {
        let command =
            import_check_command("cloudify-cli", Some(Path::new("env")), "python", Platform::Linux);

        assert_eq!(
            command.program(),
            Path::new("env").join("bin").join("python").display().to_string()
        );
        assert_eq!(command.arguments(), ["-c", "import cloudify_cli"]);
    }

    #[cfg(unix)]
    #[test]
    fn interpreter_paths_must_be_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let python = dir.path().join("python3");
        std::fs::write(&python, "#!/bin/sh\n").unwrap();
        assert_eq!(locate_python(&python.display().to_string()), None);

        std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert_eq!(locate_python(&python.display().to_string()), Some(python));
        assert_eq!(locate_python("no-such-python-4242"), None);
    }

    #[test]
    fn not_installed_passes() {
        let (logger, _sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(1);

        handle_upgrade(&runner, &logger, "cloudify", false, &import_check()).unwrap();
    }

    #[test]
    fn installed_without_upgrade_fails() {
        let (logger, sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(0);

        let result = handle_upgrade(&runner, &logger, "cloudify", false, &import_check());

        assert_matches!(result, Err(InstallerError::AlreadyInstalled { package }) if package == "cloudify");
        assert!(sink.contains(Level::Error, "--upgrade"));
    }

    #[test]
    fn installed_with_upgrade_continues() {
        let (logger, sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(0);

        handle_upgrade(&runner, &logger, "cloudify", true, &import_check()).unwrap();

        assert!(sink.contains(Level::Info, "Upgrading..."));
    }

    #[test]
    fn missing_interpreter_means_not_installed() {
        let (logger, _sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_spawn_failure("no python");

        assert!(!is_package_installed(&runner, &logger, &import_check()));
    }
}
