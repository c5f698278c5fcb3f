//! Spawning planned scripts.

use crate::plan::{ExecutionPlan, PlanError, RuntimePlanner};
use crate::probe::{RuntimeProbe, SystemProbe};
use async_trait::async_trait;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tokio::process::Command;

/// Errors from running a script, distinct from the script exiting non-zero.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Plan(#[from] PlanError),
    /// The planned command could not be started.
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    /// Writing a planned command line failed.
    #[error("failed to write plan: {0}")]
    Output(#[source] io::Error),
}

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChildExit {
    /// Exit code, absent when the child was killed by a signal.
    pub code: Option<i32>,
    /// Terminating signal number (unix only).
    pub signal: Option<i32>,
}

impl ChildExit {
    pub fn success() -> Self {
        Self {
            code: Some(0),
            signal: None,
        }
    }

    pub fn from_status(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = {
            use std::os::unix::process::ExitStatusExt;
            status.signal()
        };
        #[cfg(not(unix))]
        let signal = None;
        Self {
            code: status.code(),
            signal,
        }
    }
}

/// Runs a resolved script file with arguments.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run(&self, script: &Path, args: &[OsString]) -> Result<ChildExit, RunError>;
}

/// Plans with [`RuntimePlanner`] and spawns the result with inherited stdio and environment.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner<P = SystemProbe> {
    planner: RuntimePlanner,
    probe: P,
}

impl ProcessRunner<SystemProbe> {
    pub fn new(planner: RuntimePlanner) -> Self {
        Self::with_probe(planner, SystemProbe)
    }
}

impl<P: RuntimeProbe> ProcessRunner<P> {
    pub fn with_probe(planner: RuntimePlanner, probe: P) -> Self {
        Self { planner, probe }
    }

    pub fn plan(&self, script: &Path, args: &[OsString]) -> Result<ExecutionPlan, PlanError> {
        self.planner.plan(script, args, &self.probe)
    }
}

#[async_trait]
impl<P: RuntimeProbe> ScriptRunner for ProcessRunner<P> {
    async fn run(&self, script: &Path, args: &[OsString]) -> Result<ChildExit, RunError> {
        let plan = self.plan(script, args)?;
        tracing::debug!(
            target: "skillx::dispatch",
            command = %plan.to_shell_line(),
            "spawning script"
        );

        let status = Command::new(&plan.command)
            .args(&plan.args)
            .status()
            .await
            .map_err(|source| RunError::Spawn {
                command: plan.command.to_string_lossy().into_owned(),
                source,
            })?;

        let exit = ChildExit::from_status(status);
        tracing::debug!(
            target: "skillx::dispatch",
            code = ?exit.code,
            signal = ?exit.signal,
            "script exited"
        );
        Ok(exit)
    }
}

/// Writes the planned command line instead of spawning it.
#[derive(Debug)]
pub struct PlanOnlyRunner<W, P = SystemProbe> {
    planner: RuntimePlanner,
    probe: P,
    out: Mutex<W>,
}

impl<W: Write + Send> PlanOnlyRunner<W, SystemProbe> {
    pub fn new(planner: RuntimePlanner, out: W) -> Self {
        Self::with_probe(planner, SystemProbe, out)
    }
}

impl<W: Write + Send, P: RuntimeProbe> PlanOnlyRunner<W, P> {
    pub fn with_probe(planner: RuntimePlanner, probe: P, out: W) -> Self {
        Self {
            planner,
            probe,
            out: Mutex::new(out),
        }
    }

    /// Returns the writer, with everything printed so far.
    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl<W: Write + Send, P: RuntimeProbe> ScriptRunner for PlanOnlyRunner<W, P> {
    async fn run(&self, script: &Path, args: &[OsString]) -> Result<ChildExit, RunError> {
        let plan = self.planner.plan(script, args, &self.probe)?;
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(out, "{}", plan.to_shell_line()).map_err(RunError::Output)?;
        Ok(ChildExit::success())
    }
}
