//! External command execution with concurrent output capture
//!
//! Every shell interaction of the installer goes through a [`CommandRunner`].
//! [`ProcessRunner`] is the real implementation: it spawns the child with both
//! output streams piped and drains them on two scoped threads while the
//! calling thread waits for the child, so a chatty stderr can never fill its
//! pipe and stall a child whose stdout is the only stream being read. Once
//! the child has exited the readers collect what is left in the pipes and
//! stop, without waiting for background processes that inherited them.

mod reader;
mod scripted;

use std::fmt;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::Level;

use crate::error::{InstallerError, Result};
use crate::logging::Logger;

pub use scripted::ScriptedRunner;

/// Command line to execute: a program followed by its argument tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote(&self.program))?;
        for arg in &self.args {
            write!(f, " {}", quote(arg))?;
        }
        Ok(())
    }
}

fn quote(token: &str) -> String {
    if token.is_empty() || token.contains(char::is_whitespace) {
        format!("\"{token}\"")
    } else {
        token.to_string()
    }
}

/// Outcome of one finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessResult {
    /// Exit code; `-1` when the child was terminated by a signal
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Executes commands synchronously
///
/// A non-zero exit status is NOT an error: implementations return it in the
/// [`ProcessResult`] and leave the interpretation to the caller. `Err` is
/// reserved for commands that could not be run at all.
pub trait CommandRunner {
    /// Run `command` to completion. With `suppress_errors` set, stderr lines
    /// are captured but not logged.
    fn run(&self, command: &Command, suppress_errors: bool) -> Result<ProcessResult>;
}

/// Runs commands as child processes of the installer
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    logger: Logger,
}

impl ProcessRunner {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &Command, suppress_errors: bool) -> Result<ProcessResult> {
        self.logger.debug(format!("Executing: {command}..."));

        let mut child = std::process::Command::new(command.program())
            .args(command.arguments())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InstallerError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stderr_level = if suppress_errors {
            None
        } else {
            Some(Level::Error)
        };
        let logger = &self.logger;
        let exited = AtomicBool::new(false);
        let exited = &exited;

        let (status, stdout, stderr) = thread::scope(|scope| {
            let stdout_reader = scope
                .spawn(move || reader::drain(stdout, logger, Some(Level::Debug), exited));
            let stderr_reader =
                scope.spawn(move || reader::drain(stderr, logger, stderr_level, exited));

            let status = child.wait();
            exited.store(true, Ordering::Release);

            // Readers finish once the pipes are drained, even if a background
            // process inherited them and keeps them open.
            (
                status,
                stdout_reader.join().unwrap_or_default(),
                stderr_reader.join().unwrap_or_default(),
            )
        });

        let status = status.map_err(|source| InstallerError::Spawn {
            command: command.to_string(),
            source,
        })?;

        Ok(ProcessResult {
            status: status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}
