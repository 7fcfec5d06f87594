//! Virtualenv layout helpers and creation

use std::path::{Path, PathBuf};

use super::platform::Platform;
use crate::error::{InstallerError, Result};
use crate::logging::Logger;
use crate::process::{Command, CommandRunner};

/// Directory holding the environment's executables
pub fn env_bin_path(env: &Path, platform: Platform) -> PathBuf {
    if platform.is_windows() {
        env.join("Scripts")
    } else {
        env.join("bin")
    }
}

/// Path of an executable inside the environment (`pip`, `python`, ...)
pub fn env_executable(env: &Path, platform: Platform, name: &str) -> PathBuf {
    env_bin_path(env, platform).join(name)
}

pub fn activation_script(env: &Path, platform: Platform) -> PathBuf {
    let script = if platform.is_windows() {
        "activate.bat"
    } else {
        "activate"
    };
    env_bin_path(env, platform).join(script)
}

/// An environment counts as created once its activation script exists
pub fn has_activation_script(env: &Path, platform: Platform) -> bool {
    activation_script(env, platform).is_file()
}

/// Shell command that activates the environment
pub fn activation_command(env: &Path, platform: Platform) -> String {
    let activate = env_bin_path(env, platform).join("activate");
    if platform.is_windows() {
        format!("{}.bat", activate.display())
    } else {
        format!("source {}", activate.display())
    }
}

/// Create a virtualenv at `dir` using `python_path` as its interpreter
pub fn make_virtualenv(
    runner: &dyn CommandRunner,
    logger: &Logger,
    dir: &Path,
    python_path: &str,
) -> Result<()> {
    logger.info(format!("Creating Virtualenv {}...", dir.display()));
    let command = Command::new("virtualenv")
        .arg("-p")
        .arg(python_path)
        .arg(dir.display().to_string());

    let result = runner.run(&command, false)?;
    if !result.success() {
        return Err(InstallerError::Virtualenv(dir.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ScriptedRunner;
    use assert_matches::assert_matches;

    #[test]
    fn bin_path_follows_platform_layout() {
        let env = Path::new("venv");
        assert_eq!(env_bin_path(env, Platform::Linux), Path::new("venv/bin"));
        assert_eq!(env_bin_path(env, Platform::Windows), Path::new("venv/Scripts"));
    }

    #[test]
    fn activation_command_per_platform() {
        let env = Path::new("venv");
        assert_eq!(
            activation_command(env, Platform::Darwin),
            format!("source {}", Path::new("venv/bin/activate").display())
        );
        assert!(activation_command(env, Platform::Windows).ends_with("activate.bat"));
    }

    #[test]
    fn detects_existing_environment() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_activation_script(dir.path(), Platform::Linux));

        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::write(dir.path().join("bin/activate"), "").unwrap();
        assert!(has_activation_script(dir.path(), Platform::Linux));
    }

    #[test]
    fn creation_failure_is_fatal() {
        let (logger, _sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(1);

        let result = make_virtualenv(&runner, &logger, Path::new("env"), "python3");

        assert_matches!(result, Err(InstallerError::Virtualenv(path)) if path == Path::new("env"));
        assert_eq!(runner.executed_lines(), vec!["virtualenv -p python3 env"]);
    }
}
