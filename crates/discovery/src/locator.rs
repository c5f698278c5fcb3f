use crate::roots::skill_search_roots;
use crate::scripts::{
    find_script_for_base, is_directory, list_available_commands, MAIN_SCRIPT, SCRIPTS_DIR,
};
use crate::types::{ListedSkill, ResolveContext};
use skillx_state::absolutize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// True when `skill_root/scripts` holds a `main` script or any other command.
pub fn is_runnable_skill(skill_root: &Path) -> bool {
    let scripts_dir = skill_root.join(SCRIPTS_DIR);
    if !is_directory(&scripts_dir) {
        return false;
    }
    find_script_for_base(&scripts_dir.join(MAIN_SCRIPT)).is_some()
        || !list_available_commands(&scripts_dir).is_empty()
}

/// Lists every runnable skill visible from `ctx`, highest precedence first.
///
/// Exact overrides come first in config order. Each search root then
/// contributes its subdirectories sorted by name; a name already listed is
/// skipped.
pub fn list_available_skills(ctx: &ResolveContext) -> Vec<ListedSkill> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut skills = Vec::new();

    for (name, path) in ctx.overrides.configured_skill_paths() {
        if seen.contains(name) {
            continue;
        }
        let root = absolutize(&ctx.cwd, path);
        if is_runnable_skill(&root) {
            seen.insert(name.clone());
            skills.push(ListedSkill {
                name: name.clone(),
                root,
            });
        } else {
            trace!(
                target: "skillx::locator",
                name = %name,
                "configured skill path is not runnable"
            );
        }
    }

    for root in skill_search_roots(ctx) {
        if !is_directory(&root) {
            continue;
        }
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !is_directory(entry.path()) {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if seen.contains(name) || !is_runnable_skill(entry.path()) {
                continue;
            }
            seen.insert(name.to_string());
            skills.push(ListedSkill {
                name: name.to_string(),
                root: entry.path().to_path_buf(),
            });
        }
    }

    debug!(target: "skillx::locator", count = skills.len(), "listed skills");
    skills
}
