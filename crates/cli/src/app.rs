use crate::cli::Cli;
use crate::signals::{reraise, shield_while_child_runs};
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use skillx_discovery::{is_directory, labeled_search_roots, list_available_skills, ResolveContext};
use skillx_runner::{
    dispatch_skill, ExitReport, PlanOnlyRunner, ProcessRunner, RuntimePlanner, ScriptRunner,
    EXIT_FAILURE,
};
use skillx_state::ENV_LOG;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Entry point used by `main`: parses `std::env::args_os` and returns the exit code.
pub fn run() -> Result<i32> {
    init_tracing();
    let argv: Vec<OsString> = std::env::args_os().collect();
    run_with(&argv)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_with(argv: &[OsString]) -> Result<i32> {
    match argv.get(1) {
        None => return print_help_to_stderr(),
        Some(first) if first.is_empty() => return print_help_to_stderr(),
        Some(first) if !looks_like_flag(first) => {
            return dispatch(first, &argv[2..], Mode::Run);
        }
        Some(_) => {}
    }

    let cli = match Cli::try_parse_from(argv) {
        Ok(cli) => cli,
        Err(e) => {
            e.print()?;
            return Ok(e.exit_code());
        }
    };

    if let Some(flag) = cli.mode_flag() {
        if !cli.invocation.is_empty() {
            eprintln!("skillx: {flag} does not accept positional arguments");
            return Ok(EXIT_FAILURE);
        }
    }

    if cli.list {
        return list_skills();
    }
    if cli.roots {
        return print_roots();
    }
    if let Some(values) = &cli.set_path {
        return match values.as_slice() {
            [skill, path] => set_path(skill, Path::new(path)),
            _ => print_help_to_stderr(),
        };
    }
    if let Some(root) = &cli.add_root {
        return add_root(root);
    }

    let mode = if cli.dry_run { Mode::DryRun } else { Mode::Run };
    match cli.invocation.split_first() {
        Some((skill, args)) if !skill.is_empty() => dispatch(skill, args, mode),
        _ => print_help_to_stderr(),
    }
}

fn looks_like_flag(arg: &OsStr) -> bool {
    arg.as_encoded_bytes().first() == Some(&b'-')
}

fn print_help_to_stderr() -> Result<i32> {
    let help = Cli::command().render_help();
    eprint!("{help}");
    Ok(EXIT_FAILURE)
}

/// Rejects names that could escape a search root.
fn validate_skill_name(raw: &OsStr) -> Option<&str> {
    let name = raw.to_str()?;
    if name.is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return None;
    }
    Some(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Run,
    DryRun,
}

fn dispatch(raw_skill: &OsStr, args: &[OsString], mode: Mode) -> Result<i32> {
    let Some(skill) = validate_skill_name(raw_skill) else {
        eprintln!("skillx: invalid skill name '{}'", raw_skill.to_string_lossy());
        return Ok(EXIT_FAILURE);
    };

    let ctx = ResolveContext::from_process().context("failed to read the process environment")?;
    let planner = RuntimePlanner::from_env(&ctx.env);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let report = match mode {
        Mode::Run => {
            shield_while_child_runs()?;
            let runner = ProcessRunner::new(planner);
            runtime.block_on(run_dispatch(skill, args, &ctx, &runner))?
        }
        Mode::DryRun => {
            let runner = PlanOnlyRunner::new(planner, io::stdout());
            runtime.block_on(run_dispatch(skill, args, &ctx, &runner))?
        }
    };

    if let Some(signal) = report.signal {
        tracing::debug!(target: "skillx::dispatch", signal, "re-raising child signal");
        reraise(signal)?;
        return Ok(EXIT_FAILURE);
    }
    Ok(report.code)
}

async fn run_dispatch(
    skill: &str,
    args: &[OsString],
    ctx: &ResolveContext,
    runner: &dyn ScriptRunner,
) -> Result<ExitReport> {
    let mut stderr = io::stderr();
    let report = dispatch_skill(skill, args, ctx, runner, &mut stderr)
        .await
        .context("failed to write diagnostics")?;
    Ok(report)
}

fn list_skills() -> Result<i32> {
    let ctx = ResolveContext::from_process()?;
    let skills = list_available_skills(&ctx);
    let mut out = io::stdout().lock();
    if skills.is_empty() {
        writeln!(out, "No skills found.")?;
    }
    for skill in skills {
        writeln!(out, "{}", skill.name)?;
    }
    Ok(0)
}

fn print_roots() -> Result<i32> {
    let ctx = ResolveContext::from_process()?;
    let mut out = io::stdout().lock();
    for root in labeled_search_roots(&ctx) {
        let state = if is_directory(&root.path) {
            ""
        } else {
            " (missing)"
        };
        writeln!(out, "{}\t{}{}", root.source, root.path.display(), state)?;
    }
    Ok(0)
}

fn set_path(raw_skill: &OsStr, path: &Path) -> Result<i32> {
    let Some(skill) = validate_skill_name(raw_skill) else {
        eprintln!("skillx: invalid skill name '{}'", raw_skill.to_string_lossy());
        return Ok(EXIT_FAILURE);
    };
    let ctx = ResolveContext::from_process()?;
    match ctx.config_store().save_skill_path_override(skill, path, ctx.cwd()) {
        Ok(saved) => {
            println!(
                "Saved path for '{skill}': {}",
                saved.resolved_skill_path.display()
            );
            println!("Config: {}", saved.config_path.display());
            Ok(0)
        }
        Err(e) => {
            eprintln!("skillx: {e}");
            Ok(EXIT_FAILURE)
        }
    }
}

fn add_root(root: &Path) -> Result<i32> {
    let ctx = ResolveContext::from_process()?;
    match ctx.config_store().save_skill_root(root, ctx.cwd()) {
        Ok(saved) => {
            println!("Added skills root: {}", saved.resolved_skill_root.display());
            println!("Config: {}", saved.config_path.display());
            Ok(0)
        }
        Err(e) => {
            eprintln!("skillx: {e}");
            Ok(EXIT_FAILURE)
        }
    }
}
