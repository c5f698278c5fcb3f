//! JSON config store backing skill path overrides and extra skill roots.
//!
//! The file lives at `$SKILLX_CONFIG` or `~/.skillx/config.json`:
//!
//! ```json
//! {
//!   "skillPaths": { "alpha": "/abs/path/to/alpha", "beta": "../relative/beta" },
//!   "skillRoots": ["/abs/skills", "../more-skills"]
//! }
//! ```
//!
//! Relative entries resolve against the config file's own directory. Reads
//! used for lookups are lenient: a missing or malformed file yields no
//! overrides. Reads that precede a save are strict so an unreadable file is
//! never clobbered.

use crate::env::config_path;
use crate::paths::{absolutize, normalize};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by strict config reads and by saves.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file is not valid JSON.
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The top-level value is not an object.
    #[error("invalid config format in {}", .path.display())]
    InvalidFormat { path: PathBuf },
    /// `skillPaths` is present but not an object.
    #[error("invalid skillPaths in {}", .path.display())]
    InvalidSkillPaths { path: PathBuf },
    /// `skillRoots` is present but not an array of strings.
    #[error("invalid skillRoots in {}", .path.display())]
    InvalidSkillRoots { path: PathBuf },
    #[error("skill path is not a directory: {}", .path.display())]
    SkillPathNotDirectory { path: PathBuf },
    #[error("skills root is not a directory: {}", .path.display())]
    SkillRootNotDirectory { path: PathBuf },
    /// Writing the updated file failed.
    #[error("failed to write config at {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Raw config contents, as written in the file (paths not yet resolved).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    /// Skill name to configured path, in file order.
    pub skill_paths: Vec<(String, String)>,
    /// Extra search roots, in file order.
    pub skill_roots: Vec<String>,
}

impl ConfigFile {
    /// Validates and normalises a parsed JSON document.
    ///
    /// Non-string or empty `skillPaths` values and empty `skillRoots`
    /// entries are dropped rather than rejected.
    fn from_value(value: Value, path: &Path) -> Result<Self, ConfigError> {
        let Value::Object(mut object) = value else {
            return Err(ConfigError::InvalidFormat {
                path: path.to_path_buf(),
            });
        };

        let skill_paths = match object.remove("skillPaths") {
            None => Vec::new(),
            Some(Value::Object(map)) => map
                .into_iter()
                .filter_map(|(name, value)| match value {
                    Value::String(p) if !p.is_empty() => Some((name, p)),
                    _ => None,
                })
                .collect(),
            Some(_) => {
                return Err(ConfigError::InvalidSkillPaths {
                    path: path.to_path_buf(),
                })
            }
        };

        let skill_roots = match object.remove("skillRoots") {
            None => Vec::new(),
            Some(Value::Array(items)) => {
                let mut roots = Vec::with_capacity(items.len());
                for item in items {
                    let Value::String(root) = item else {
                        return Err(ConfigError::InvalidSkillRoots {
                            path: path.to_path_buf(),
                        });
                    };
                    if !root.is_empty() {
                        roots.push(root);
                    }
                }
                roots
            }
            Some(_) => {
                return Err(ConfigError::InvalidSkillRoots {
                    path: path.to_path_buf(),
                })
            }
        };

        Ok(Self {
            skill_paths,
            skill_roots,
        })
    }

    fn to_json(&self) -> Result<String, ConfigError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Document<'a> {
            skill_paths: Map<String, Value>,
            skill_roots: &'a [String],
        }

        let skill_paths = self
            .skill_paths
            .iter()
            .map(|(name, p)| (name.clone(), Value::String(p.clone())))
            .collect();
        let mut text = serde_json::to_string_pretty(&Document {
            skill_paths,
            skill_roots: &self.skill_roots,
        })?;
        text.push('\n');
        Ok(text)
    }
}

/// Overrides consumed by skill resolution, already resolved to absolute paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkillOverrides {
    skill_paths: Vec<(String, PathBuf)>,
    skill_roots: Vec<PathBuf>,
}

impl SkillOverrides {
    /// Overrides from already-resolved exact paths and extra roots.
    pub fn new(skill_paths: Vec<(String, PathBuf)>, skill_roots: Vec<PathBuf>) -> Self {
        Self {
            skill_paths,
            skill_roots,
        }
    }

    /// Adds an exact path override for `name`, replacing an earlier one.
    pub fn with_skill_path(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let name = name.into();
        let path = path.into();
        match self.skill_paths.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = path,
            None => self.skill_paths.push((name, path)),
        }
        self
    }

    /// Appends an extra search root.
    pub fn with_skill_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.skill_roots.push(root.into());
        self
    }

    /// Exact override for `name`, if configured.
    pub fn configured_skill_path(&self, name: &str) -> Option<&Path> {
        self.skill_paths
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p.as_path())
    }

    /// Every exact override, in config order.
    pub fn configured_skill_paths(&self) -> &[(String, PathBuf)] {
        &self.skill_paths
    }

    /// Extra search roots, in config order.
    pub fn configured_skill_roots(&self) -> &[PathBuf] {
        &self.skill_roots
    }
}

/// Result of persisting a skill path override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSkillPathResult {
    pub config_path: PathBuf,
    pub resolved_skill_path: PathBuf,
}

/// Result of persisting an extra skills root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveSkillRootResult {
    pub config_path: PathBuf,
    pub resolved_skill_root: PathBuf,
}

/// Handle to the config file at a fixed location.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the location derived from `SKILLX_CONFIG` or the home directory.
    pub fn from_env(env: &HashMap<String, String>, home: &Path) -> Self {
        Self::new(config_path(env, home))
    }

    /// Location of the config file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file, failing on anything other than a clean parse or a missing file.
    pub fn read_strict(&self) -> Result<ConfigFile, ConfigError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ConfigFile::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let value: Value = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        ConfigFile::from_value(value, &self.path)
    }

    /// Reads the file for lookups; any failure means "no overrides".
    pub fn read_lenient(&self) -> ConfigFile {
        match self.read_strict() {
            Ok(config) => {
                tracing::trace!(
                    target: "skillx::config",
                    path = %self.path.display(),
                    skill_paths = config.skill_paths.len(),
                    skill_roots = config.skill_roots.len(),
                    "Loaded config"
                );
                config
            }
            Err(e) => {
                tracing::warn!(
                    target: "skillx::config",
                    error = %e,
                    "Ignoring unreadable config"
                );
                ConfigFile::default()
            }
        }
    }

    /// Exact override for `name`, resolved to an absolute path.
    pub fn configured_skill_path(&self, name: &str) -> Option<PathBuf> {
        let config = self.read_lenient();
        config
            .skill_paths
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| self.resolve_entry(p))
    }

    /// Every exact override, resolved, in file order.
    pub fn configured_skill_paths(&self) -> Vec<(String, PathBuf)> {
        let config = self.read_lenient();
        self.resolve_paths(&config)
    }

    /// Extra search roots, resolved and deduplicated, in file order.
    pub fn configured_skill_roots(&self) -> Vec<PathBuf> {
        let config = self.read_lenient();
        self.resolve_roots(&config)
    }

    /// Both override kinds from a single lenient read.
    pub fn overrides(&self) -> SkillOverrides {
        let config = self.read_lenient();
        SkillOverrides::new(self.resolve_paths(&config), self.resolve_roots(&config))
    }

    /// Persists `skill_path` (resolved against `cwd`) as the override for `skill_name`.
    pub fn save_skill_path_override(
        &self,
        skill_name: &str,
        skill_path: &Path,
        cwd: &Path,
    ) -> Result<SaveSkillPathResult, ConfigError> {
        let resolved = absolutize(cwd, skill_path);
        if !resolved.is_dir() {
            return Err(ConfigError::SkillPathNotDirectory { path: resolved });
        }

        let mut config = self.read_strict()?;
        let value = resolved.to_string_lossy().into_owned();
        match config.skill_paths.iter_mut().find(|(n, _)| n == skill_name) {
            Some(entry) => entry.1 = value,
            None => config.skill_paths.push((skill_name.to_string(), value)),
        }
        self.write(&config)?;

        tracing::debug!(
            target: "skillx::config",
            skill = skill_name,
            path = %resolved.display(),
            "Saved skill path override"
        );
        Ok(SaveSkillPathResult {
            config_path: self.path.clone(),
            resolved_skill_path: resolved,
        })
    }

    /// Appends `skill_root` (resolved against `cwd`) to the extra search roots.
    ///
    /// Existing entries are rewritten in resolved form; a root already present
    /// is not added twice.
    pub fn save_skill_root(
        &self,
        skill_root: &Path,
        cwd: &Path,
    ) -> Result<SaveSkillRootResult, ConfigError> {
        let resolved = absolutize(cwd, skill_root);
        if !resolved.is_dir() {
            return Err(ConfigError::SkillRootNotDirectory { path: resolved });
        }

        let mut config = self.read_strict()?;
        let mut roots: Vec<PathBuf> = config
            .skill_roots
            .iter()
            .map(|r| self.resolve_entry(r))
            .collect();
        if !roots.contains(&resolved) {
            roots.push(resolved.clone());
        }
        config.skill_roots = roots
            .iter()
            .map(|r| r.to_string_lossy().into_owned())
            .collect();
        self.write(&config)?;

        tracing::debug!(
            target: "skillx::config",
            root = %resolved.display(),
            "Saved skills root"
        );
        Ok(SaveSkillRootResult {
            config_path: self.path.clone(),
            resolved_skill_root: resolved,
        })
    }

    fn resolve_entry(&self, entry: &str) -> PathBuf {
        let entry = Path::new(entry);
        if entry.is_absolute() {
            return normalize(entry);
        }
        let base = self.path.parent().unwrap_or_else(|| Path::new("."));
        absolutize(base, entry)
    }

    fn resolve_paths(&self, config: &ConfigFile) -> Vec<(String, PathBuf)> {
        config
            .skill_paths
            .iter()
            .map(|(name, p)| (name.clone(), self.resolve_entry(p)))
            .collect()
    }

    fn resolve_roots(&self, config: &ConfigFile) -> Vec<PathBuf> {
        let mut seen = std::collections::HashSet::new();
        config
            .skill_roots
            .iter()
            .map(|r| self.resolve_entry(r))
            .filter(|r| seen.insert(r.clone()))
            .collect()
    }

    fn write(&self, config: &ConfigFile) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = config.to_json()?;

        // Write a sibling temp file, then rename it over the config.
        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, text).map_err(write_err)?;
        fs::rename(&temp_path, &self.path).map_err(write_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillx_test_utils::write_config;
    use std::fs;
    use tempfile::tempdir;

    fn store_in(home: &Path) -> ConfigStore {
        ConfigStore::from_env(&HashMap::new(), home)
    }

    #[test]
    fn saves_skill_path_under_default_location() {
        /*
        GIVEN an empty home and an existing skill directory
        WHEN saving a skill path override
        THEN ~/.skillx/config.json should hold it and lookups should return it
        */
        let home = tempdir().unwrap();
        let skill = tempdir().unwrap();
        let store = store_in(home.path());

        let result = store
            .save_skill_path_override("alpha", skill.path(), home.path())
            .unwrap();

        assert_eq!(
            result.config_path,
            home.path().join(".skillx").join("config.json")
        );
        assert_eq!(result.resolved_skill_path, skill.path());

        let raw = fs::read_to_string(&result.config_path).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            parsed["skillPaths"]["alpha"].as_str(),
            Some(skill.path().to_str().unwrap())
        );
        assert!(raw.ends_with("}\n"));
        assert_eq!(
            store.configured_skill_path("alpha"),
            Some(skill.path().to_path_buf())
        );
    }

    #[test]
    fn relative_skill_path_entries_resolve_against_config_dir() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"skillPaths":{"alpha":"../skills/alpha"}}"#).unwrap();

        let resolved = store_in(home.path()).configured_skill_path("alpha");
        assert_eq!(resolved, Some(home.path().join("skills").join("alpha")));
    }

    #[test]
    fn rejects_non_directory_skill_path() {
        let home = tempdir().unwrap();
        let missing = home.path().join("does-not-exist");

        let err = store_in(home.path())
            .save_skill_path_override("alpha", &missing, home.path())
            .unwrap_err();
        assert!(err.to_string().contains("skill path is not a directory"));
        assert!(!home.path().join(".skillx").exists());
    }

    #[test]
    fn saving_a_root_twice_keeps_one_entry() {
        let home = tempdir().unwrap();
        let root = tempdir().unwrap();
        let store = store_in(home.path());

        let first = store.save_skill_root(root.path(), home.path()).unwrap();
        let second = store.save_skill_root(root.path(), home.path()).unwrap();

        assert_eq!(
            first.config_path,
            home.path().join(".skillx").join("config.json")
        );
        assert_eq!(second.resolved_skill_root, root.path());
        assert_eq!(store.configured_skill_roots(), vec![root.path().to_path_buf()]);
    }

    #[test]
    fn relative_roots_resolve_against_config_dir() {
        let home = tempdir().unwrap();
        write_config(home.path(), r#"{"skillRoots":["../skills", "../skills/"]}"#).unwrap();

        assert_eq!(
            store_in(home.path()).configured_skill_roots(),
            vec![home.path().join("skills")]
        );
    }

    #[test]
    fn rejects_non_directory_root() {
        let home = tempdir().unwrap();
        let err = store_in(home.path())
            .save_skill_root(&home.path().join("missing-roots"), home.path())
            .unwrap_err();
        assert!(err.to_string().contains("skills root is not a directory"));
    }

    #[test]
    fn saving_a_path_preserves_roots() {
        /*
        GIVEN a config with skillRoots
        WHEN a skill path override is saved
        THEN skillRoots should be left untouched
        */
        let home = tempdir().unwrap();
        let skill = tempdir().unwrap();
        let roots = tempdir().unwrap();
        let config_path = write_config(
            home.path(),
            &serde_json::json!({ "skillRoots": [roots.path()] }).to_string(),
        )
        .unwrap();

        store_in(home.path())
            .save_skill_path_override("alpha", skill.path(), home.path())
            .unwrap();

        let parsed: Value =
            serde_json::from_str(&fs::read_to_string(config_path).unwrap()).unwrap();
        assert_eq!(
            parsed["skillRoots"],
            serde_json::json!([roots.path().to_str().unwrap()])
        );
    }

    #[test]
    fn malformed_config_is_lenient_for_lookups_and_fatal_for_saves() {
        /*
        GIVEN a config file that is not valid JSON
        WHEN looking up overrides
        THEN no overrides should be reported
        AND saving should fail without rewriting the file
        */
        let home = tempdir().unwrap();
        let skill = tempdir().unwrap();
        let config_path = write_config(home.path(), "{not json").unwrap();
        let store = store_in(home.path());

        assert_eq!(store.overrides(), SkillOverrides::default());

        let err = store
            .save_skill_path_override("alpha", skill.path(), home.path())
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to parse config at"));
        assert_eq!(fs::read_to_string(config_path).unwrap(), "{not json");
    }

    #[test]
    fn strict_read_names_the_invalid_field() {
        let home = tempdir().unwrap();
        let store = store_in(home.path());

        write_config(home.path(), "[]").unwrap();
        assert!(matches!(
            store.read_strict(),
            Err(ConfigError::InvalidFormat { .. })
        ));

        write_config(home.path(), r#"{"skillPaths":["a"]}"#).unwrap();
        assert!(matches!(
            store.read_strict(),
            Err(ConfigError::InvalidSkillPaths { .. })
        ));

        write_config(home.path(), r#"{"skillRoots":[1]}"#).unwrap();
        let err = store.read_strict().unwrap_err();
        assert!(err.to_string().starts_with("invalid skillRoots in"));
    }

    #[test]
    fn non_string_and_empty_entries_are_dropped() {
        let home = tempdir().unwrap();
        write_config(
            home.path(),
            r#"{"skillPaths":{"a":"/x","b":3,"c":""},"skillRoots":["","/r"]}"#,
        )
        .unwrap();

        let config = store_in(home.path()).read_strict().unwrap();
        assert_eq!(config.skill_paths, vec![("a".to_string(), "/x".to_string())]);
        assert_eq!(config.skill_roots, vec!["/r".to_string()]);
    }

    #[test]
    fn skill_paths_keep_file_order() {
        let home = tempdir().unwrap();
        write_config(
            home.path(),
            r#"{"skillPaths":{"zeta":"/z","alpha":"/a","mid":"/m"}}"#,
        )
        .unwrap();

        let names: Vec<_> = store_in(home.path())
            .configured_skill_paths()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn overrides_builder_replaces_existing_name() {
        let overrides = SkillOverrides::default()
            .with_skill_path("a", "/one")
            .with_skill_path("a", "/two")
            .with_skill_root("/root");
        assert_eq!(overrides.configured_skill_path("a"), Some(Path::new("/two")));
        assert_eq!(overrides.configured_skill_paths().len(), 1);
        assert_eq!(overrides.configured_skill_roots(), &[PathBuf::from("/root")]);
    }
}
