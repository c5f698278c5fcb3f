use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Overrides the location of the skillx config file.
pub const ENV_CONFIG: &str = "SKILLX_CONFIG";
/// Overrides the primary agent skills root (`~/.agents/skills`).
pub const ENV_SKILLS_HOME: &str = "SCRIPT_SKILLS_HOME";
/// Overrides the Claude skills root (`~/.claude/skills`).
pub const ENV_CLAUDE_SKILLS_HOME: &str = "SCRIPT_CLAUDE_SKILLS_HOME";
/// Overrides the OpenClaw skills root.
pub const ENV_OPENCLAW_SKILLS_HOME: &str = "SCRIPT_OPENCLAW_SKILLS_HOME";
/// OpenClaw state directory; skills live in its `skills/` child.
pub const ENV_OPENCLAW_STATE_DIR: &str = "OPENCLAW_STATE_DIR";
/// Codex home directory; skills live in its `skills/` child.
pub const ENV_CODEX_HOME: &str = "CODEX_HOME";
/// Host node executable used to run JavaScript and native TypeScript.
pub const ENV_NODE: &str = "SKILLX_NODE";
/// Log filter for the skillx binary.
pub const ENV_LOG: &str = "SKILLX_LOG";

/// Snapshot of the process environment, skipping entries that are not valid UTF-8.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Looks up `key`, treating an empty value as unset.
pub fn env_value<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

/// Returns the user's home directory.
pub fn home_dir() -> Result<PathBuf> {
    #[cfg(unix)]
    if let Ok(home) = std::env::var("HOME") {
        if !home.is_empty() {
            return Ok(PathBuf::from(home));
        }
    }
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("home directory not found"))
}

/// Returns the config file path: `$SKILLX_CONFIG` or `<home>/.skillx/config.json`.
pub fn config_path(env: &HashMap<String, String>, home: &Path) -> PathBuf {
    env_value(env, ENV_CONFIG)
        .map(PathBuf::from)
        .unwrap_or_else(|| home.join(".skillx").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_defaults_to_home() {
        /*
        GIVEN no SKILLX_CONFIG override
        WHEN resolving the config path
        THEN it should live under ~/.skillx
        */
        let env = HashMap::new();
        let path = config_path(&env, Path::new("/home/u"));
        assert_eq!(path, PathBuf::from("/home/u/.skillx/config.json"));
    }

    #[test]
    fn config_path_respects_env_override() {
        let env = HashMap::from([(ENV_CONFIG.to_string(), "/etc/skillx.json".to_string())]);
        assert_eq!(
            config_path(&env, Path::new("/home/u")),
            PathBuf::from("/etc/skillx.json")
        );
    }

    #[test]
    fn empty_env_values_are_unset() {
        let env = HashMap::from([(ENV_CONFIG.to_string(), String::new())]);
        assert_eq!(env_value(&env, ENV_CONFIG), None);
        assert_eq!(
            config_path(&env, Path::new("/h")),
            PathBuf::from("/h/.skillx/config.json")
        );
    }
}
