//! Command runner that replays canned results instead of spawning processes

use std::cell::RefCell;
use std::collections::VecDeque;

use super::{Command, CommandRunner, ProcessResult};
use crate::error::{InstallerError, Result};

/// Test double for [`CommandRunner`]
///
/// Results are handed out in the order they were queued; once the queue is
/// empty every further command gets the fallback status (0 unless changed).
/// Every command is recorded for later inspection.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    queue: RefCell<VecDeque<Scripted>>,
    executed: RefCell<Vec<Command>>,
    fallback_status: i32,
}

#[derive(Debug)]
enum Scripted {
    Finished(ProcessResult),
    SpawnFailure(String),
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exit status returned once the queue runs dry
    pub fn with_fallback_status(mut self, status: i32) -> Self {
        self.fallback_status = status;
        self
    }

    /// Queue a result with the given status and empty output
    pub fn then_status(self, status: i32) -> Self {
        self.then_result(ProcessResult {
            status,
            ..ProcessResult::default()
        })
    }

    pub fn then_result(self, result: ProcessResult) -> Self {
        self.queue.borrow_mut().push_back(Scripted::Finished(result));
        self
    }

    /// Queue a failure to launch the command at all
    pub fn then_spawn_failure(self, reason: impl Into<String>) -> Self {
        self.queue
            .borrow_mut()
            .push_back(Scripted::SpawnFailure(reason.into()));
        self
    }

    pub fn executed(&self) -> Vec<Command> {
        self.executed.borrow().clone()
    }

    pub fn executed_lines(&self) -> Vec<String> {
        self.executed.borrow().iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, command: &Command, _suppress_errors: bool) -> Result<ProcessResult> {
        self.executed.borrow_mut().push(command.clone());
        match self.queue.borrow_mut().pop_front() {
            Some(Scripted::Finished(result)) => Ok(result),
            Some(Scripted::SpawnFailure(reason)) => Err(InstallerError::Spawn {
                command: command.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, reason),
            }),
            None => Ok(ProcessResult {
                status: self.fallback_status,
                ..ProcessResult::default()
            }),
        }
    }
}
