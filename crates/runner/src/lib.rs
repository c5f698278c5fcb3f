//! Turns a skill invocation into a running script.
//!
//! - [`dispatch`] walks candidate skill roots and picks a subcommand or `main` script.
//! - [`plan`] chooses a runtime for the script from ordered runner tables.
//! - [`process`] spawns the plan, or prints it for dry runs.

#![deny(unsafe_code)]

pub mod dispatch;
pub mod plan;
pub mod probe;
pub mod process;
mod version;

pub use dispatch::{
    dispatch_skill, dispatch_within_skill_root, DispatchOutcome, ExitReport, EXIT_FAILURE,
    EXIT_NOT_FOUND, EXIT_USAGE,
};
pub use plan::{ExecutionPlan, PlanError, RuntimePlanner, DEFAULT_NODE};
pub use probe::{FixedProbe, RuntimeProbe, SystemProbe};
pub use process::{ChildExit, PlanOnlyRunner, ProcessRunner, RunError, ScriptRunner};
pub use version::{parse_version, supports_native_typescript};
