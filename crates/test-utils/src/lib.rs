//! Shared test utilities for skillx crates.
//!
//! This crate provides fixtures for laying out skill directories, config
//! files and throwaway git repositories inside temp directories.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Body written into plain test scripts.
pub const SCRIPT_BODY: &str = "console.log('ok');\n";
/// Body written into shebang test scripts.
pub const SHEBANG_BODY: &str = "#!/usr/bin/env bash\necho ok\n";

/// Writes `<skill_root>/scripts/<file_name>` with a trivial body, creating parents.
pub fn write_script(skill_root: &Path, file_name: &str) -> std::io::Result<PathBuf> {
    let path = skill_root.join("scripts").join(file_name);
    write_file(&path, SCRIPT_BODY)?;
    Ok(path)
}

/// Writes an executable `#!` script at `path`, creating parents.
pub fn write_shebang_script(path: &Path) -> std::io::Result<PathBuf> {
    write_file(path, SHEBANG_BODY)?;
    set_mode(path, 0o755)?;
    Ok(path.to_path_buf())
}

/// Writes `contents` to `<home>/.skillx/config.json` and returns its path.
pub fn write_config(home: &Path, contents: &str) -> std::io::Result<PathBuf> {
    let path = home.join(".skillx").join("config.json");
    write_file(&path, contents)?;
    Ok(path)
}

/// Sets unix permission bits on `path`.
pub fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = (path, mode);
    Ok(())
}

/// Runs `git init` in `dir` and returns the canonical repository root.
///
/// Returns `None` when git is not installed so callers can skip repo-tier tests.
pub fn init_git_repo(dir: &Path) -> Option<PathBuf> {
    let status = Command::new("git")
        .arg("init")
        .arg("-q")
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .ok()?;
    if !status.success() {
        return None;
    }
    dir.canonicalize().ok()
}

fn write_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

/// Temp home directory with helpers for the conventional skill roots.
///
/// The tempdir is removed when this struct is dropped.
pub struct SkillFixture {
    pub tempdir: tempfile::TempDir,
}

impl SkillFixture {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            tempdir: tempfile::tempdir()?,
        })
    }

    /// Path to use as the home directory.
    pub fn home(&self) -> &Path {
        self.tempdir.path()
    }

    /// `<home>/<relative_root>/<name>`, e.g. `skill_dir(".agents/skills", "alpha")`.
    pub fn skill_dir(&self, relative_root: &str, name: &str) -> PathBuf {
        self.home().join(relative_root).join(name)
    }

    /// Creates a skill under `<home>/<relative_root>/<name>` with one script file.
    ///
    /// Returns the skill directory.
    pub fn create_skill(
        &self,
        relative_root: &str,
        name: &str,
        script: &str,
    ) -> std::io::Result<PathBuf> {
        let skill = self.skill_dir(relative_root, name);
        write_script(&skill, script)?;
        Ok(skill)
    }
}
