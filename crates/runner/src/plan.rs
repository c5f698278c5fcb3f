//! Maps a script file to the command line that runs it.
//!
//! Each runtime family has an ordered table of runner rules. The first rule
//! whose command is available wins; an exhausted table is a [`PlanError`].

use crate::probe::RuntimeProbe;
use crate::version::supports_native_typescript;
use skillx_discovery::{is_executable_with_shebang, ScriptFamily, ScriptKind};
use skillx_state::{env_value, ENV_NODE};
use std::cell::OnceCell;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default host node executable.
pub const DEFAULT_NODE: &str = "node";

/// A runtime could not be chosen for a script.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error(
        "No supported TypeScript runner found for .ts script. Supported TypeScript runners: \
         bun, node (v22.18+, v23+, or v24.3+), tsx, ts-node, deno. {}",
        detected_node(.node, .node_version.as_deref())
    )]
    NoTypeScriptRunner {
        node: String,
        node_version: Option<String>,
    },
    #[error("No Python runtime found for .py script. Install `uv` (recommended) or `python3`.")]
    NoPythonRuntime,
    #[error("`bash` is required to run .sh scripts.")]
    BashMissing,
    #[error("Unsupported script type: {}", .path.display())]
    Unsupported { path: PathBuf },
}

fn detected_node(node: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("Detected node version: {v}."),
        None => format!("Node version could not be detected from '{node}'."),
    }
}

/// Exactly what to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub command: OsString,
    pub args: Vec<OsString>,
}

impl ExecutionPlan {
    /// The plan as a single shell-quoted line.
    ///
    /// ```
    /// use skillx_runner::ExecutionPlan;
    ///
    /// let plan = ExecutionPlan {
    ///     command: "bash".into(),
    ///     args: vec!["/s/run.sh".into(), "two words".into(), "it's".into()],
    /// };
    /// assert_eq!(plan.to_shell_line(), r#"bash /s/run.sh 'two words' 'it'\''s'"#);
    /// ```
    pub fn to_shell_line(&self) -> String {
        std::iter::once(self.command.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(arg: &OsStr) -> String {
    let arg = arg.to_string_lossy();
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:,@%+".contains(c));
    if plain {
        arg.into_owned()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[derive(Debug, Clone, Copy)]
enum Launcher {
    Named(&'static str),
    HostNode,
}

#[derive(Debug, Clone, Copy)]
enum Gate {
    Always,
    Installed,
    NativeTypeScript,
}

#[derive(Debug, Clone, Copy)]
struct RunnerRule {
    launcher: Launcher,
    leading_args: &'static [&'static str],
    gate: Gate,
}

const fn rule(launcher: Launcher, leading_args: &'static [&'static str], gate: Gate) -> RunnerRule {
    RunnerRule {
        launcher,
        leading_args,
        gate,
    }
}

const JAVASCRIPT_RULES: &[RunnerRule] = &[rule(Launcher::HostNode, &[], Gate::Always)];

const TYPESCRIPT_RULES: &[RunnerRule] = &[
    rule(Launcher::Named("bun"), &[], Gate::Installed),
    rule(Launcher::HostNode, &[], Gate::NativeTypeScript),
    rule(Launcher::Named("tsx"), &[], Gate::Installed),
    rule(Launcher::Named("ts-node"), &[], Gate::Installed),
    rule(Launcher::Named("deno"), &["run"], Gate::Installed),
];

const PYTHON_RULES: &[RunnerRule] = &[
    rule(Launcher::Named("uv"), &["run"], Gate::Installed),
    rule(Launcher::Named("python3"), &[], Gate::Installed),
];

const SHELL_RULES: &[RunnerRule] = &[rule(Launcher::Named("bash"), &[], Gate::Installed)];

/// Per-call view of the probe; the node version is asked for at most once.
struct PlanInputs<'a> {
    probe: &'a dyn RuntimeProbe,
    node: &'a str,
    node_version: OnceCell<Option<String>>,
}

impl PlanInputs<'_> {
    fn node_version(&self) -> Option<&str> {
        self.node_version
            .get_or_init(|| self.probe.version(self.node))
            .as_deref()
    }

    fn command<'r>(&'r self, launcher: Launcher) -> &'r str {
        match launcher {
            Launcher::Named(name) => name,
            Launcher::HostNode => self.node,
        }
    }

    fn eligible(&self, rule: &RunnerRule) -> bool {
        match rule.gate {
            Gate::Always => true,
            Gate::Installed => self.probe.exists(self.command(rule.launcher)),
            Gate::NativeTypeScript => self.node_version().is_some_and(supports_native_typescript),
        }
    }
}

/// Chooses runtimes for scripts.
#[derive(Debug, Clone)]
pub struct RuntimePlanner {
    node: String,
}

impl Default for RuntimePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimePlanner {
    pub fn new() -> Self {
        Self {
            node: DEFAULT_NODE.to_string(),
        }
    }

    /// Planner whose host node comes from `SKILLX_NODE` when set.
    pub fn from_env(env: &HashMap<String, String>) -> Self {
        match env_value(env, ENV_NODE) {
            Some(node) => Self::new().with_node(node),
            None => Self::new(),
        }
    }

    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = node.into();
        self
    }

    pub fn node(&self) -> &str {
        &self.node
    }

    /// Plans how to run `script` with `args`.
    ///
    /// The extension is matched case-insensitively. Files without a known
    /// extension run directly when they are executable shebang scripts.
    pub fn plan(
        &self,
        script: &Path,
        args: &[OsString],
        probe: &dyn RuntimeProbe,
    ) -> Result<ExecutionPlan, PlanError> {
        let family = script
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ScriptKind::from_extension(&ext.to_ascii_lowercase()))
            .map(ScriptKind::family);

        let inputs = PlanInputs {
            probe,
            node: &self.node,
            node_version: OnceCell::new(),
        };

        let (rules, exhausted) = match family {
            Some(ScriptFamily::JavaScript) => (JAVASCRIPT_RULES, None),
            Some(ScriptFamily::TypeScript) => (TYPESCRIPT_RULES, None),
            Some(ScriptFamily::Python) => (PYTHON_RULES, Some(PlanError::NoPythonRuntime)),
            Some(ScriptFamily::Shell) => (SHELL_RULES, Some(PlanError::BashMissing)),
            Some(ScriptFamily::Shebang) | None => {
                return if is_executable_with_shebang(script) {
                    tracing::debug!(
                        target: "skillx::plan",
                        script = %script.display(),
                        "running shebang script directly"
                    );
                    Ok(ExecutionPlan {
                        command: script.as_os_str().to_os_string(),
                        args: args.to_vec(),
                    })
                } else {
                    Err(PlanError::Unsupported {
                        path: script.to_path_buf(),
                    })
                };
            }
        };

        for rule in rules {
            if !inputs.eligible(rule) {
                continue;
            }
            let command = inputs.command(rule.launcher);
            tracing::debug!(
                target: "skillx::plan",
                script = %script.display(),
                command,
                "selected runner"
            );
            let args = rule
                .leading_args
                .iter()
                .map(OsString::from)
                .chain(std::iter::once(script.as_os_str().to_os_string()))
                .chain(args.iter().cloned())
                .collect();
            return Ok(ExecutionPlan {
                command: command.into(),
                args,
            });
        }

        Err(exhausted.unwrap_or_else(|| PlanError::NoTypeScriptRunner {
            node: self.node.clone(),
            node_version: inputs.node_version().map(str::to_string),
        }))
    }
}
