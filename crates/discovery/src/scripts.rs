//! Script lookup inside a skill's `scripts/` directory.
//!
//! Every probe here fails soft: a missing or unreadable entry reads as
//! "not there" so resolution can move on to the next candidate.

use crate::types::{ScriptKind, ScriptMatch};
use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::trace;
use walkdir::WalkDir;

/// Name of the default script, without extension.
pub const MAIN_SCRIPT: &str = "main";
/// Directory under a skill root holding its scripts.
pub const SCRIPTS_DIR: &str = "scripts";

pub fn is_directory(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}

pub fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// True for a regular file with any execute bit set whose first two bytes are `#!`.
pub fn is_executable_with_shebang(path: &Path) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() || !has_execute_bit(&meta) {
        return false;
    }
    let mut head = [0u8; 2];
    match fs::File::open(path).and_then(|mut f| f.read_exact(&mut head)) {
        Ok(()) => &head == b"#!",
        Err(_) => false,
    }
}

#[cfg(unix)]
fn has_execute_bit(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_execute_bit(_meta: &fs::Metadata) -> bool {
    false
}

/// Resolves `base` (a path with no extension, e.g. `<skill>/scripts/build`) to a script.
///
/// Extensions are tried in [`ScriptKind::BY_PRIORITY`] order and the first
/// regular file wins. Failing that, `base` itself matches when it is an
/// executable shebang file.
pub fn find_script_for_base(base: &Path) -> Option<ScriptMatch> {
    for kind in ScriptKind::BY_PRIORITY {
        let Some(ext) = kind.extension() else {
            continue;
        };
        let candidate = with_appended_extension(base, ext);
        if is_regular_file(&candidate) {
            trace!(target: "skillx::discovery", path = %candidate.display(), "script matched");
            return Some(ScriptMatch {
                path: candidate,
                kind,
            });
        }
    }
    if is_executable_with_shebang(base) {
        return Some(ScriptMatch {
            path: base.to_path_buf(),
            kind: ScriptKind::Shebang,
        });
    }
    None
}

/// Resolves `<skill_root>/scripts/<name>`.
pub fn find_skill_script(skill_root: &Path, name: &str) -> Option<ScriptMatch> {
    find_script_for_base(&skill_root.join(SCRIPTS_DIR).join(name))
}

/// Sorted, de-duplicated subcommand names available in `scripts_dir`.
///
/// Regular files with a supported extension contribute their stem; executable
/// shebang files contribute their whole name. `main` and subdirectories are
/// never listed. An unreadable directory yields an empty list.
pub fn list_available_commands(scripts_dir: &Path) -> Vec<String> {
    let mut names = BTreeSet::new();
    for entry in WalkDir::new(scripts_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !is_regular_file(path) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(stem) = supported_stem(file_name) {
            if stem != MAIN_SCRIPT {
                names.insert(stem.to_string());
            }
        } else if file_name != MAIN_SCRIPT && is_executable_with_shebang(path) {
            names.insert(file_name.to_string());
        }
    }
    names.into_iter().collect()
}

fn supported_stem(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() {
        return None;
    }
    ScriptKind::from_extension(ext).map(|_| stem)
}

fn with_appended_extension(base: &Path, ext: &str) -> PathBuf {
    let mut raw = base.as_os_str().to_os_string();
    raw.push(ext);
    PathBuf::from(raw)
}
