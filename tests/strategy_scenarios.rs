use std::path::{Path, PathBuf};

use assert_matches::assert_matches;
use cloudify_bootstrap::InstallerError;
use cloudify_bootstrap::install::{InstallOutcome, InstallPlan, InstallStrategy, Platform};
use cloudify_bootstrap::logging::Logger;
use cloudify_bootstrap::process::ScriptedRunner;
use log::Level;
use rstest::rstest;

fn plan(wheels_path: &Path) -> InstallPlan {
    InstallPlan {
        package: "cloudify".to_string(),
        version: Some("3.3".to_string()),
        pre: false,
        wheels_path: wheels_path.to_path_buf(),
        force_online: false,
        requirement_files: Vec::new(),
        virtualenv: None,
        upgrade: false,
    }
}

fn is_offline(line: &str) -> bool {
    line.contains("--no-index")
}

#[test]
fn missing_wheel_directory_goes_straight_online() {
    let (logger, _sink) = Logger::memory();
    let runner = ScriptedRunner::new();
    let strategy = InstallStrategy::new(&runner, logger, Platform::Linux);

    let outcome = strategy
        .install(&plan(&PathBuf::from("/nonexistent/wheelhouse")))
        .unwrap();

    assert_eq!(outcome, InstallOutcome::Online);
    assert_eq!(runner.executed_lines(), vec!["pip install cloudify==3.3"]);
}

#[test]
fn successful_offline_attempt_runs_once() {
    let wheels = tempfile::tempdir().unwrap();
    let (logger, sink) = Logger::memory();
    let runner = ScriptedRunner::new().then_status(0);
    let strategy = InstallStrategy::new(&runner, logger, Platform::Linux);

    let outcome = strategy.install(&plan(wheels.path())).unwrap();

    assert_eq!(outcome, InstallOutcome::Offline);
    let lines = runner.executed_lines();
    assert_eq!(lines.len(), 1);
    assert!(is_offline(&lines[0]));
    assert!(sink.contains(Level::Info, "Wheels directory found"));
}

#[test]
fn forced_online_ignores_an_existing_wheel_directory() {
    let wheels = tempfile::tempdir().unwrap();
    let (logger, _sink) = Logger::memory();
    let runner = ScriptedRunner::new().then_status(0);
    let strategy = InstallStrategy::new(&runner, logger, Platform::Linux);
    let mut plan = plan(wheels.path());
    plan.force_online = true;

    let outcome = strategy.install(&plan).unwrap();

    assert_eq!(outcome, InstallOutcome::Online);
    let lines = runner.executed_lines();
    assert_eq!(lines, vec!["pip install cloudify==3.3"]);
    assert!(!is_offline(&lines[0]));
}

#[test]
fn failed_offline_attempt_falls_back_online_once() {
    let wheels = tempfile::tempdir().unwrap();
    let (logger, sink) = Logger::memory();
    let runner = ScriptedRunner::new().then_status(1).then_status(0);
    let strategy = InstallStrategy::new(&runner, logger, Platform::Linux);

    let outcome = strategy.install(&plan(wheels.path())).unwrap();

    assert_eq!(outcome, InstallOutcome::OnlineAfterFallback);
    let lines = runner.executed_lines();
    assert_eq!(lines.len(), 2);
    assert!(is_offline(&lines[0]));
    assert_eq!(lines[1], "pip install cloudify==3.3");
    assert!(sink.contains(Level::Warn, "Offline installation failed"));
}

#[test]
fn failed_online_fallback_is_fatal_and_names_the_package() {
    let wheels = tempfile::tempdir().unwrap();
    let (logger, _sink) = Logger::memory();
    let runner = ScriptedRunner::new().with_fallback_status(1);
    let strategy = InstallStrategy::new(&runner, logger, Platform::Linux);

    let result = strategy.install(&plan(wheels.path()));

    assert_eq!(runner.executed().len(), 2);
    let error = result.unwrap_err();
    assert_ne!(error.exit_code(), 0);
    assert!(error.to_string().contains("cloudify"));
    assert_matches!(error, InstallerError::PackageInstall { .. });
}

#[rstest]
#[case(0, 1)]
#[case(1, 2)]
#[case(2, 2)]
#[case(127, 2)]
fn offline_status_decides_number_of_attempts(#[case] offline_status: i32, #[case] attempts: usize) {
    let wheels = tempfile::tempdir().unwrap();
    let (logger, _sink) = Logger::memory();
    let runner = ScriptedRunner::new().then_status(offline_status).then_status(0);
    let strategy = InstallStrategy::new(&runner, logger, Platform::Linux);

    strategy.install(&plan(wheels.path())).unwrap();

    assert_eq!(runner.executed().len(), attempts);
}

#[test]
fn fallback_keeps_requirements_virtualenv_and_upgrade() {
    let wheels = tempfile::tempdir().unwrap();
    let (logger, _sink) = Logger::memory();
    let runner = ScriptedRunner::new().then_status(1);
    let strategy = InstallStrategy::new(&runner, logger, Platform::Linux);
    let mut plan = plan(wheels.path());
    plan.requirement_files = vec!["requirements.txt".to_string()];
    plan.virtualenv = Some(PathBuf::from("env"));
    plan.upgrade = true;

    strategy.install(&plan).unwrap();

    let online = &runner.executed()[1];
    assert_eq!(
        online.program(),
        Path::new("env").join("bin").join("pip").display().to_string()
    );
    assert_eq!(
        online.arguments(),
        ["install", "-r", "requirements.txt", "cloudify==3.3", "--upgrade"]
    );
}
