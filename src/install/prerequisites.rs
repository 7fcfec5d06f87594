//! Installation of the tooling the package install depends on
//!
//! pip (via get-pip.py), the Python headers plus a compiler on Linux, and the
//! prebuilt PyCrypto installer on Windows.

use std::path::Path;
use std::time::Duration;

use super::detection::{import_check_command, is_package_installed};
use super::download::download_file;
use super::platform::{OsInfo, Platform, is_arch};
use super::virtualenv::env_executable;
use crate::error::{InstallerError, Result};
use crate::logging::Logger;
use crate::process::{Command, CommandRunner};

/// Outcome of looking up a python-dev command for a host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PythonDevAction {
    Run(Command),
    /// Headers ship with Python on this platform
    NotRequired,
    Unsupported,
}

/// Pick the package-manager invocation that provides Python headers and gcc
pub fn pythondev_action(platform: Platform, distro: &str, arch: bool) -> PythonDevAction {
    match distro {
        "ubuntu" | "debian" => PythonDevAction::Run(
            Command::new("apt-get").args(["install", "-y", "gcc", "python-dev"]),
        ),
        "centos" | "redhat" | "rhel" | "fedora" => PythonDevAction::Run(
            Command::new("yum").args(["-y", "install", "gcc", "python-devel"]),
        ),
        // Arch's python package already carries the headers.
        _ if arch => {
            PythonDevAction::Run(Command::new("pacman").args(["-S", "gcc", "--noconfirm"]))
        }
        _ if platform.is_darwin() => PythonDevAction::NotRequired,
        _ => PythonDevAction::Unsupported,
    }
}

/// PyCrypto build matching the pointer width of the host Python
pub fn pycrypto_installer_url(components_url: &str, is_32bit: bool) -> String {
    let file = if is_32bit {
        "pycrypto-2.6.win32-py2.7.exe"
    } else {
        "pycrypto-2.6.win-amd64-py2.7.exe"
    };
    format!("{}/{file}", components_url.trim_end_matches('/'))
}

/// Installs prerequisites through a [`CommandRunner`]
pub struct Prerequisites<'a> {
    runner: &'a dyn CommandRunner,
    logger: Logger,
    os: &'a OsInfo,
    python_path: &'a str,
    components_url: &'a str,
    download_timeout: Duration,
}

impl<'a> Prerequisites<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        logger: Logger,
        os: &'a OsInfo,
        python_path: &'a str,
        components_url: &'a str,
        download_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            logger,
            os,
            python_path,
            components_url,
            download_timeout,
        }
    }

    /// Bootstrap pip with get-pip.py unless the target interpreter can import it
    pub fn install_pip(&self) -> Result<()> {
        self.logger.info("Installing pip...");
        let import_check = import_check_command("pip", None, self.python_path, self.os.platform);
        if is_package_installed(self.runner, &self.logger, &import_check) {
            self.logger.info("pip is already installed in the path.");
            return Ok(());
        }

        let url = format!("{}/get-pip.py", self.components_url.trim_end_matches('/'));
        // Removed on drop, whichever way this function returns.
        let tempdir = tempfile::tempdir()?;
        let get_pip = tempdir.path().join("get-pip.py");

        download_file(&url, &get_pip, &self.logger, self.download_timeout).map_err(|e| {
            InstallerError::PipInstall(format!("Failed downloading pip from {url}. ({e})"))
        })?;

        let command = Command::new(self.python_path).arg(get_pip.display().to_string());
        let result = self.runner.run(&command, false)?;
        if !result.success() {
            return Err(InstallerError::PipInstall(
                "get-pip.py exited with a non-zero status".to_string(),
            ));
        }
        Ok(())
    }

    /// Install Python headers and gcc with the distribution's package manager
    pub fn install_pythondev(&self) -> Result<()> {
        self.logger.info("Installing python-dev...");
        let command = match pythondev_action(self.os.platform, &self.os.distro, is_arch()) {
            PythonDevAction::Run(command) => command,
            PythonDevAction::NotRequired => {
                self.logger
                    .info(format!("python-dev package not required on {}.", self.os.platform));
                return Ok(());
            }
            PythonDevAction::Unsupported => {
                return Err(InstallerError::PythonDev(
                    "python-dev package installation not supported in current distribution."
                        .to_string(),
                ));
            }
        };

        let result = self.runner.run(&command, false)?;
        if !result.success() {
            self.logger.warn(format!(
                "python-dev installation exited with status {}; continuing.",
                result.status
            ));
        }
        Ok(())
    }

    /// Windows only: install the prebuilt PyCrypto with easy_install
    pub fn install_pycrypto(&self, virtualenv: Option<&Path>) -> Result<()> {
        let is_32bit = cfg!(target_pointer_width = "32");
        self.logger.info(format!(
            "Installing PyCrypto {}bit...",
            if is_32bit { "32" } else { "64" }
        ));

        let easy_install = match virtualenv {
            Some(env) => env_executable(env, self.os.platform, "easy_install")
                .display()
                .to_string(),
            None => "easy_install".to_string(),
        };
        let command =
            Command::new(easy_install).arg(pycrypto_installer_url(self.components_url, is_32bit));

        let result = self.runner.run(&command, false)?;
        if !result.success() {
            self.logger.warn(format!(
                "PyCrypto installation exited with status {}; continuing.",
                result.status
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ScriptedRunner;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve `body` to a single HTTP request, returning the base URL
    fn serve_once(body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut request = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                loop {
                    line.clear();
                    match request.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => {}
                    }
                }
                write!(
                    stream,
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                )
                .unwrap();
                stream.write_all(body).unwrap();
            }
        });

        format!("http://{addr}")
    }

    fn linux_prerequisites<'a>(
        runner: &'a ScriptedRunner,
        logger: Logger,
        os: &'a OsInfo,
        components_url: &'a str,
    ) -> Prerequisites<'a> {
        Prerequisites::new(
            runner,
            logger,
            os,
            "python3",
            components_url,
            Duration::from_secs(10),
        )
    }

    #[test]
    fn importable_pip_is_not_reinstalled() {
        let (logger, sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(0);
        let os = OsInfo::new(Platform::Linux, "ubuntu", "22.04");

        linux_prerequisites(&runner, logger, &os, "http://127.0.0.1:9")
            .install_pip()
            .unwrap();

        assert_eq!(runner.executed_lines(), vec!["python3 -c \"import pip\""]);
        assert!(sink.contains(log::Level::Info, "pip is already installed"));
    }

    #[test]
    fn get_pip_download_failure_is_fatal() {
        let (logger, _sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(1);
        let os = OsInfo::new(Platform::Linux, "ubuntu", "22.04");

        let result = linux_prerequisites(&runner, logger, &os, "not a url").install_pip();

        assert_matches!(
            result,
            Err(InstallerError::PipInstall(msg)) if msg.starts_with("Failed downloading pip from not a url/get-pip.py")
        );
        assert_eq!(runner.executed().len(), 1);
    }

    #[test]
    fn downloaded_get_pip_runs_with_the_configured_python() {
        let base = serve_once(b"print('installing pip')\n");
        let (logger, _sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(1).then_status(0);
        let os = OsInfo::new(Platform::Linux, "ubuntu", "22.04");

        linux_prerequisites(&runner, logger, &os, &base)
            .install_pip()
            .unwrap();

        let executed = runner.executed();
        assert_eq!(executed.len(), 2);
        assert_eq!(executed[1].program(), "python3");
        assert!(executed[1].arguments()[0].ends_with("get-pip.py"));
    }

    #[test]
    fn get_pip_non_zero_exit_is_fatal() {
        let base = serve_once(b"raise SystemExit(2)\n");
        let (logger, _sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(1).then_status(2);
        let os = OsInfo::new(Platform::Linux, "ubuntu", "22.04");

        let result = linux_prerequisites(&runner, logger, &os, &base).install_pip();

        assert_matches!(result, Err(InstallerError::PipInstall(_)));
        assert_eq!(runner.executed().len(), 2);
    }

    #[rstest]
    #[case("ubuntu", "apt-get install -y gcc python-dev")]
    #[case("debian", "apt-get install -y gcc python-dev")]
    #[case("centos", "yum -y install gcc python-devel")]
    #[case("fedora", "yum -y install gcc python-devel")]
    fn pythondev_commands_per_distro(#[case] distro: &str, #[case] expected: &str) {
        assert_matches!(
            pythondev_action(Platform::Linux, distro, false),
            PythonDevAction::Run(command) if command.to_string() == expected
        );
    }

    #[test]
    fn arch_uses_pacman() {
        assert_matches!(
            pythondev_action(Platform::Linux, "arch", true),
            PythonDevAction::Run(command) if command.program() == "pacman"
        );
    }

    #[test]
    fn darwin_needs_nothing_and_unknown_is_unsupported() {
        assert_eq!(
            pythondev_action(Platform::Darwin, "", false),
            PythonDevAction::NotRequired
        );
        assert_eq!(
            pythondev_action(Platform::Linux, "gentoo", false),
            PythonDevAction::Unsupported
        );
    }

    #[test]
    fn pycrypto_url_matches_pointer_width() {
        let base = "http://repo/components/";
        assert_eq!(
            pycrypto_installer_url(base, true),
            "http://repo/components/pycrypto-2.6.win32-py2.7.exe"
        );
        assert_eq!(
            pycrypto_installer_url(base, false),
            "http://repo/components/pycrypto-2.6.win-amd64-py2.7.exe"
        );
    }

    #[test]
    fn pycrypto_runs_from_virtualenv_scripts() {
        let (logger, _sink) = Logger::memory();
        let runner = ScriptedRunner::new();
        let os = OsInfo::new(Platform::Windows, "", "");
        let prerequisites = Prerequisites::new(
            &runner,
            logger,
            &os,
            "python",
            "http://repo",
            Duration::from_secs(1),
        );

        prerequisites
            .install_pycrypto(Some(Path::new("env")))
            .unwrap();

        let executed = runner.executed();
        assert_eq!(
            executed[0].program(),
            Path::new("env")
                .join("Scripts")
                .join("easy_install")
                .display()
                .to_string()
        );
    }

    #[test]
    fn failed_pythondev_command_is_not_fatal() {
        let (logger, sink) = Logger::memory();
        let runner = ScriptedRunner::new().then_status(100);
        let os = OsInfo::new(Platform::Linux, "ubuntu", "22.04");
        let prerequisites = Prerequisites::new(
            &runner,
            logger,
            &os,
            "python",
            "http://repo",
            Duration::from_secs(1),
        );

        prerequisites.install_pythondev().unwrap();

        assert!(sink.contains(log::Level::Warn, "status 100"));
    }
}
