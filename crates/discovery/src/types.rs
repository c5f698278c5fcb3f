use skillx_state::{ConfigStore, SkillOverrides};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::Result;

/// File kind of a resolved script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    Ts,
    Mts,
    Cts,
    Js,
    Mjs,
    Cjs,
    Py,
    Sh,
    /// Extensionless executable whose first two bytes are `#!`.
    Shebang,
}

impl ScriptKind {
    /// Extension kinds in lookup priority order.
    pub const BY_PRIORITY: [ScriptKind; 8] = [
        ScriptKind::Ts,
        ScriptKind::Mts,
        ScriptKind::Cts,
        ScriptKind::Js,
        ScriptKind::Mjs,
        ScriptKind::Cjs,
        ScriptKind::Py,
        ScriptKind::Sh,
    ];

    /// Dotted extension (`".ts"`), or `None` for [`ScriptKind::Shebang`].
    pub fn extension(self) -> Option<&'static str> {
        match self {
            ScriptKind::Ts => Some(".ts"),
            ScriptKind::Mts => Some(".mts"),
            ScriptKind::Cts => Some(".cts"),
            ScriptKind::Js => Some(".js"),
            ScriptKind::Mjs => Some(".mjs"),
            ScriptKind::Cjs => Some(".cjs"),
            ScriptKind::Py => Some(".py"),
            ScriptKind::Sh => Some(".sh"),
            ScriptKind::Shebang => None,
        }
    }

    /// Parses an extension without its leading dot. Matching is exact.
    ///
    /// ```
    /// use skillx_discovery::ScriptKind;
    ///
    /// assert_eq!(ScriptKind::from_extension("mts"), Some(ScriptKind::Mts));
    /// assert_eq!(ScriptKind::from_extension("TS"), None);
    /// assert_eq!(ScriptKind::from_extension("txt"), None);
    /// ```
    pub fn from_extension(ext: &str) -> Option<ScriptKind> {
        Self::BY_PRIORITY
            .into_iter()
            .find(|kind| kind.extension().map(|e| &e[1..]) == Some(ext))
    }

    /// Runtime family that decides which runners are tried.
    pub fn family(self) -> ScriptFamily {
        match self {
            ScriptKind::Ts | ScriptKind::Mts | ScriptKind::Cts => ScriptFamily::TypeScript,
            ScriptKind::Js | ScriptKind::Mjs | ScriptKind::Cjs => ScriptFamily::JavaScript,
            ScriptKind::Py => ScriptFamily::Python,
            ScriptKind::Sh => ScriptFamily::Shell,
            ScriptKind::Shebang => ScriptFamily::Shebang,
        }
    }

    /// Comma-separated list of supported extensions, for help text.
    pub fn supported_extensions_text() -> String {
        Self::BY_PRIORITY
            .iter()
            .filter_map(|k| k.extension())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Runtime family a script kind belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptFamily {
    TypeScript,
    JavaScript,
    Python,
    Shell,
    Shebang,
}

/// A concrete script file resolved from a base path such as `scripts/main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptMatch {
    /// Absolute path to the script file.
    pub path: PathBuf,
    /// How the file was matched.
    pub kind: ScriptKind,
}

/// A skill found by the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedSkill {
    /// Directory name, or the config key for an exact override.
    pub name: String,
    /// The skill directory.
    pub root: PathBuf,
}

/// Where a search root came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum RootSource {
    /// `skillRoots` entry from the config file (indexed in file order).
    Configured(usize),
    /// Conventional directory inside the current git repository.
    Repo,
    /// `$SCRIPT_SKILLS_HOME` or `~/.agents/skills`.
    Agents,
    /// `~/.agent/skills`.
    Agent,
    /// `$SCRIPT_CLAUDE_SKILLS_HOME` or `~/.claude/skills`.
    Claude,
    /// OpenClaw skills: `$SCRIPT_OPENCLAW_SKILLS_HOME`, `$OPENCLAW_STATE_DIR/skills`
    /// or `~/.openclaw/skills`.
    OpenClaw,
    /// `$CODEX_HOME/skills` or `~/.codex/skills`.
    Codex,
}

impl RootSource {
    /// Returns a stable label for this source.
    pub fn label(&self) -> String {
        match self {
            RootSource::Configured(n) => format!("config{n}"),
            RootSource::Repo => "repo".into(),
            RootSource::Agents => "agents".into(),
            RootSource::Agent => "agent".into(),
            RootSource::Claude => "claude".into(),
            RootSource::OpenClaw => "openclaw".into(),
            RootSource::Codex => "codex".into(),
        }
    }
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A directory whose immediate children may be skills, with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    /// Normalised absolute directory path.
    pub path: PathBuf,
    /// The tier that contributed this root.
    pub source: RootSource,
}

/// How the repository tier finds its top-level directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RepoRoot {
    /// Ask git for the top-level of the working directory.
    #[default]
    Detect,
    /// Use this directory as the repository root.
    Known(PathBuf),
    /// Skip the repository tier.
    Absent,
}

/// Everything a resolution call reads, passed explicitly instead of read from globals.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub home: PathBuf,
    pub repo_root: RepoRoot,
    pub overrides: SkillOverrides,
}

impl ResolveContext {
    /// Context with an empty environment, git detection and no overrides.
    pub fn new(cwd: impl Into<PathBuf>, home: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            env: HashMap::new(),
            home: home.into(),
            repo_root: RepoRoot::Detect,
            overrides: SkillOverrides::default(),
        }
    }

    /// Context for the running process: real cwd, environment, home and config file.
    pub fn from_process() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let home = skillx_state::home_dir()?;
        Ok(Self::new(cwd, home)
            .with_env(skillx_state::process_env())
            .with_config_overrides())
    }

    /// Replaces the environment map.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Sets one environment variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Sets how the repository root is found.
    pub fn with_repo_root(mut self, repo_root: RepoRoot) -> Self {
        self.repo_root = repo_root;
        self
    }

    /// Replaces the configured overrides.
    pub fn with_overrides(mut self, overrides: SkillOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Loads overrides from the config file this context points at.
    pub fn with_config_overrides(self) -> Self {
        let overrides = self.config_store().overrides();
        self.with_overrides(overrides)
    }

    /// Config store located by this context's environment and home directory.
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::from_env(&self.env, &self.home)
    }

    /// Working directory relative paths resolve against.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillx_test_utils::write_config;
    use tempfile::tempdir;

    #[test]
    fn extension_priority_is_typed_then_plain_then_python_then_shell() {
        let exts: Vec<_> = ScriptKind::BY_PRIORITY
            .iter()
            .filter_map(|k| k.extension())
            .collect();
        assert_eq!(
            exts,
            vec![".ts", ".mts", ".cts", ".js", ".mjs", ".cjs", ".py", ".sh"]
        );
        assert_eq!(
            ScriptKind::supported_extensions_text(),
            ".ts, .mts, .cts, .js, .mjs, .cjs, .py, .sh"
        );
    }

    #[test]
    fn families_group_extensions() {
        assert_eq!(ScriptKind::Cts.family(), ScriptFamily::TypeScript);
        assert_eq!(ScriptKind::Mjs.family(), ScriptFamily::JavaScript);
        assert_eq!(ScriptKind::Py.family(), ScriptFamily::Python);
        assert_eq!(ScriptKind::Sh.family(), ScriptFamily::Shell);
        assert_eq!(ScriptKind::Shebang.family(), ScriptFamily::Shebang);
        assert_eq!(ScriptKind::from_extension(""), None);
    }

    #[test]
    fn root_source_labels_are_stable() {
        assert_eq!(RootSource::Configured(2).label(), "config2");
        assert_eq!(RootSource::OpenClaw.to_string(), "openclaw");
    }

    #[test]
    fn config_overrides_follow_context_home() {
        /*
        GIVEN a config file under the context's home
        WHEN loading overrides through the context
        THEN the configured path should be visible
        */
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"skillPaths":{"alpha":"/opt/alpha"}}"#).unwrap();

        let ctx = ResolveContext::new(home.path(), home.path()).with_config_overrides();
        assert_eq!(
            ctx.overrides.configured_skill_path("alpha"),
            Some(Path::new("/opt/alpha"))
        );
    }
}
