//! Routes `skillx <skill> [args...]` to a script.

use crate::process::ScriptRunner;
use skillx_discovery::{
    find_script_for_base, is_directory, list_available_commands, skill_candidate_paths,
    ResolveContext, MAIN_SCRIPT, SCRIPTS_DIR,
};
use skillx_state::normalize;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::{self, Path, PathBuf};
use tracing::debug;

/// Exit code when no root provides the skill.
pub const EXIT_NOT_FOUND: i32 = 127;
/// Exit code for an unknown subcommand or a missing default script.
pub const EXIT_USAGE: i32 = 2;
/// Exit code for local failures such as a missing runtime.
pub const EXIT_FAILURE: i32 = 1;

/// Final result of a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitReport {
    pub code: i32,
    /// Signal that terminated the child, to be re-raised by the caller.
    pub signal: Option<i32>,
}

impl ExitReport {
    pub fn code(code: i32) -> Self {
        Self { code, signal: None }
    }
}

/// Result of trying a single skill root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled(ExitReport),
    /// The root has nothing runnable; try the next one.
    NotHandled,
}

/// Dispatches `skill_name` across every candidate root in precedence order.
///
/// The first root that handles the call decides the result. When none does,
/// `skillx: command not found: <name>` is written to `stderr` and the exit
/// code is 127.
pub async fn dispatch_skill(
    skill_name: &str,
    args: &[OsString],
    ctx: &ResolveContext,
    runner: &dyn ScriptRunner,
    stderr: &mut dyn Write,
) -> io::Result<ExitReport> {
    for skill_root in skill_candidate_paths(skill_name, ctx) {
        debug!(
            target: "skillx::dispatch",
            skill = skill_name,
            root = %skill_root.display(),
            "trying candidate"
        );
        if let DispatchOutcome::Handled(report) =
            dispatch_within_skill_root(skill_name, &skill_root, args, runner, stderr).await?
        {
            return Ok(report);
        }
    }
    writeln!(stderr, "skillx: command not found: {skill_name}")?;
    Ok(ExitReport::code(EXIT_NOT_FOUND))
}

/// Dispatches within one skill directory.
///
/// A matching subcommand script runs with the remaining arguments, otherwise
/// `main` runs with all of them. A root that has commands but none that fit
/// prints usage and exits 2 without consulting later roots.
pub async fn dispatch_within_skill_root(
    skill_name: &str,
    skill_root: &Path,
    args: &[OsString],
    runner: &dyn ScriptRunner,
    stderr: &mut dyn Write,
) -> io::Result<DispatchOutcome> {
    let scripts_dir = skill_root.join(SCRIPTS_DIR);
    if !is_directory(&scripts_dir) {
        return Ok(DispatchOutcome::NotHandled);
    }

    let subcommand = args.first().filter(|a| !a.is_empty());

    if let Some(sub) = subcommand {
        if let Some(script) = find_script_for_base(&subcommand_base(&scripts_dir, sub)) {
            debug!(
                target: "skillx::dispatch",
                script = %script.path.display(),
                "matched subcommand"
            );
            return run_selected(&script.path, &args[1..], runner, stderr).await;
        }
    }

    if let Some(script) = find_script_for_base(&scripts_dir.join(MAIN_SCRIPT)) {
        debug!(target: "skillx::dispatch", script = %script.path.display(), "falling back to main");
        return run_selected(&script.path, args, runner, stderr).await;
    }

    let commands = list_available_commands(&scripts_dir);
    if commands.is_empty() {
        return Ok(DispatchOutcome::NotHandled);
    }

    match subcommand {
        Some(sub) => writeln!(
            stderr,
            "{skill_name}: unknown command '{}'",
            sub.to_string_lossy()
        )?,
        None => writeln!(stderr, "{skill_name}: no default 'main' script found")?,
    }
    writeln!(stderr, "Usage: {skill_name} <command> [args...]")?;
    writeln!(stderr, "Available commands: {}", commands.join(" "))?;
    Ok(DispatchOutcome::Handled(ExitReport::code(EXIT_USAGE)))
}

/// `scripts_dir/sub` with `sub` appended as text, so an absolute `sub` cannot
/// replace `scripts_dir` the way `Path::join` would.
fn subcommand_base(scripts_dir: &Path, sub: &OsStr) -> PathBuf {
    let mut base = scripts_dir.as_os_str().to_os_string();
    base.push(path::MAIN_SEPARATOR_STR);
    base.push(sub);
    normalize(Path::new(&base))
}

async fn run_selected(
    script: &Path,
    args: &[OsString],
    runner: &dyn ScriptRunner,
    stderr: &mut dyn Write,
) -> io::Result<DispatchOutcome> {
    match runner.run(script, args).await {
        Ok(exit) => Ok(DispatchOutcome::Handled(ExitReport {
            code: exit.code.unwrap_or(EXIT_FAILURE),
            signal: exit.signal,
        })),
        Err(e) => {
            writeln!(stderr, "skillx: {e}")?;
            Ok(DispatchOutcome::Handled(ExitReport::code(EXIT_FAILURE)))
        }
    }
}
