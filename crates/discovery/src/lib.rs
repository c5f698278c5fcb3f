//! Locates skills and the scripts they expose.
//!
//! This crate provides mechanisms for:
//! - Computing the ordered, de-duplicated list of skill search roots.
//! - Listing the runnable skills visible from a working directory.
//! - Resolving a script base name to a concrete file by extension priority.
//!
//! # Examples
//!
//! ```
//! use skillx_discovery::{list_available_skills, RepoRoot, ResolveContext};
//! use tempfile::tempdir;
//!
//! let home = tempdir().unwrap();
//! let scripts = home.path().join(".agents/skills/alpha/scripts");
//! std::fs::create_dir_all(&scripts).unwrap();
//! std::fs::write(scripts.join("main.ts"), "console.log('hi')").unwrap();
//!
//! let ctx = ResolveContext::new(home.path(), home.path()).with_repo_root(RepoRoot::Absent);
//! let skills = list_available_skills(&ctx);
//! assert_eq!(skills.len(), 1);
//! assert_eq!(skills[0].name, "alpha");
//! ```

#![deny(unsafe_code)]

/// Error type for discovery operations.
pub type Error = anyhow::Error;
/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Skill listing.
pub mod locator;
/// Search root precedence.
pub mod roots;
/// Script lookup by extension priority.
pub mod scripts;
/// Types shared by resolution and dispatch.
pub mod types;

pub use locator::{is_runnable_skill, list_available_skills};
pub use roots::{
    labeled_search_roots, resolve_repo_root, skill_candidate_paths, skill_search_roots,
};
pub use scripts::{
    find_script_for_base, find_skill_script, is_directory, is_executable_with_shebang,
    is_regular_file, list_available_commands, MAIN_SCRIPT, SCRIPTS_DIR,
};
pub use skillx_state::SkillOverrides;
pub use types::{
    ListedSkill, RepoRoot, ResolveContext, RootSource, ScriptFamily, ScriptKind, ScriptMatch,
    SearchRoot,
};
