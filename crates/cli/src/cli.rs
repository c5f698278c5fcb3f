use clap::{ArgAction, ArgGroup, Parser};
use skillx_discovery::ScriptKind;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::LazyLock;

static AFTER_HELP: LazyLock<String> = LazyLock::new(|| {
    format!(
        "Examples:\n  skillx my-skill --dry-run\n  skillx my-skill do --dry-run\n  \
         skillx --list\n\n\
         Entrypoint:\n  scripts/main.{{py,ts,js}}\n\n\
         Supported script extensions:\n  {}",
        ScriptKind::supported_extensions_text()
    )
});

/// Command-line interface for the `skillx` application.
///
/// `skillx <skill> [args...]` skips flag parsing entirely so every argument
/// after the skill name reaches the script untouched.
#[derive(Debug, Parser)]
#[command(
    name = "skillx",
    version,
    disable_version_flag = true,
    about = "Run skill scripts from skill directories",
    override_usage = "skillx <skill> [args...]\n       \
                      skillx <skill> <script-name> [args...]\n       \
                      skillx --list",
    after_help = AFTER_HELP.as_str(),
    group(
        ArgGroup::new("mode")
            .args(["list", "roots", "set_path", "add_root", "dry_run"])
            .multiple(false)
    )
)]
pub struct Cli {
    /// Print version.
    #[arg(short = 'V', long, short_alias = 'v', action = ArgAction::Version)]
    pub version: Option<bool>,
    /// Lists runnable skills, highest precedence first.
    #[arg(long)]
    pub list: bool,
    /// Prints every skill search root in precedence order.
    #[arg(long)]
    pub roots: bool,
    /// Saves an exact directory for a skill name.
    #[arg(long = "set-path", num_args = 2, value_names = ["SKILL", "PATH"])]
    pub set_path: Option<Vec<OsString>>,
    /// Adds a directory to the skill search roots.
    #[arg(long = "add-root", value_name = "DIR")]
    pub add_root: Option<PathBuf>,
    /// Prints the command a skill invocation would run without running it.
    #[arg(long)]
    pub dry_run: bool,
    /// Skill name followed by its arguments.
    #[arg(
        value_name = "SKILL",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub invocation: Vec<OsString>,
}

impl Cli {
    /// Flag that selected a non-dispatch mode, for error messages.
    pub fn mode_flag(&self) -> Option<&'static str> {
        if self.list {
            Some("--list")
        } else if self.roots {
            Some("--roots")
        } else if self.set_path.is_some() {
            Some("--set-path")
        } else if self.add_root.is_some() {
            Some("--add-root")
        } else {
            None
        }
    }
}
