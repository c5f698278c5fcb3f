use crate::types::{RepoRoot, ResolveContext, RootSource, SearchRoot};
use skillx_state::{
    absolutize, env_value, normalize, ENV_CLAUDE_SKILLS_HOME, ENV_CODEX_HOME,
    ENV_OPENCLAW_SKILLS_HOME, ENV_OPENCLAW_STATE_DIR, ENV_SKILLS_HOME,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, trace};

/// Skill directories looked up under a repository root, in precedence order.
const REPO_SKILL_DIRS: [&str; 6] = [
    ".agents/skill",
    ".agent/skills",
    ".agents/skills",
    ".claude/skills",
    ".codex/skills",
    "skills",
];

/// Asks git for the top-level directory containing `cwd`.
///
/// Returns `None` when git is missing, `cwd` is outside a repository, the
/// output is empty, or the reported path cannot be canonicalised.
pub fn resolve_repo_root(cwd: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .arg("-C")
        .arg(cwd)
        .args(["rev-parse", "--show-toplevel"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        trace!(target: "skillx::roots", cwd = %cwd.display(), "not inside a git repository");
        return None;
    }
    let top = String::from_utf8(output.stdout).ok()?;
    let top = top.trim();
    if top.is_empty() {
        return None;
    }
    Path::new(top).canonicalize().ok()
}

/// Search roots with the tier that contributed each one, deduplicated.
pub fn labeled_search_roots(ctx: &ResolveContext) -> Vec<SearchRoot> {
    let mut roots = Vec::new();

    for (idx, root) in ctx.overrides.configured_skill_roots().iter().enumerate() {
        roots.push(SearchRoot {
            path: absolutize(&ctx.cwd, root),
            source: RootSource::Configured(idx),
        });
    }

    let repo_root = match &ctx.repo_root {
        RepoRoot::Detect => resolve_repo_root(&ctx.cwd),
        RepoRoot::Known(path) => Some(absolutize(&ctx.cwd, path)),
        RepoRoot::Absent => None,
    };
    if let Some(repo_root) = repo_root {
        debug!(
            target: "skillx::roots",
            repo_root = %repo_root.display(),
            "including repository skill dirs"
        );
        for dir in REPO_SKILL_DIRS {
            roots.push(SearchRoot {
                path: normalize(&repo_root.join(dir)),
                source: RootSource::Repo,
            });
        }
    }

    roots.extend(home_roots(ctx));

    let roots = dedup_roots(roots);
    debug!(
        target: "skillx::roots",
        roots = ?roots.iter().map(|r| r.path.display().to_string()).collect::<Vec<_>>(),
        "computed search roots"
    );
    roots
}

/// Search roots in precedence order, deduplicated.
///
/// ```
/// use skillx_discovery::{skill_search_roots, RepoRoot, ResolveContext};
/// use std::path::PathBuf;
///
/// let ctx = ResolveContext::new("/work", "/home/u").with_repo_root(RepoRoot::Absent);
/// let roots = skill_search_roots(&ctx);
/// assert_eq!(roots[0], PathBuf::from("/home/u/.agents/skills"));
/// assert_eq!(roots.len(), 5);
/// ```
pub fn skill_search_roots(ctx: &ResolveContext) -> Vec<PathBuf> {
    labeled_search_roots(ctx)
        .into_iter()
        .map(|root| root.path)
        .collect()
}

/// Directories that may hold skill `name`, in the order dispatch tries them.
///
/// A configured exact override comes first, then every search root joined
/// with `name`.
pub fn skill_candidate_paths(name: &str, ctx: &ResolveContext) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(path) = ctx.overrides.configured_skill_path(name) {
        candidates.push(absolutize(&ctx.cwd, path));
    }
    candidates.extend(
        skill_search_roots(ctx)
            .into_iter()
            .map(|root| normalize(&root.join(name))),
    );
    dedup_paths(candidates)
}

fn home_roots(ctx: &ResolveContext) -> Vec<SearchRoot> {
    let home = &ctx.home;
    let from_env = |key: &str| env_value(&ctx.env, key).map(|v| absolutize(&ctx.cwd, Path::new(v)));

    let agents = from_env(ENV_SKILLS_HOME).unwrap_or_else(|| home.join(".agents").join("skills"));
    let agent = home.join(".agent").join("skills");
    let claude =
        from_env(ENV_CLAUDE_SKILLS_HOME).unwrap_or_else(|| home.join(".claude").join("skills"));
    let openclaw = from_env(ENV_OPENCLAW_SKILLS_HOME)
        .or_else(|| from_env(ENV_OPENCLAW_STATE_DIR).map(|dir| dir.join("skills")))
        .unwrap_or_else(|| home.join(".openclaw").join("skills"));
    let codex = from_env(ENV_CODEX_HOME)
        .map(|dir| dir.join("skills"))
        .unwrap_or_else(|| home.join(".codex").join("skills"));

    [
        (agents, RootSource::Agents),
        (agent, RootSource::Agent),
        (claude, RootSource::Claude),
        (openclaw, RootSource::OpenClaw),
        (codex, RootSource::Codex),
    ]
    .into_iter()
    .map(|(path, source)| SearchRoot {
        path: absolutize(&ctx.cwd, &path),
        source,
    })
    .collect()
}

fn dedup_roots(roots: Vec<SearchRoot>) -> Vec<SearchRoot> {
    let mut seen = HashSet::new();
    roots
        .into_iter()
        .filter(|root| seen.insert(normalize(&root.path)))
        .collect()
}

fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(normalize(path)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use skillx_state::SkillOverrides;
    use skillx_test_utils::init_git_repo;
    use tempfile::tempdir;

    fn ctx() -> ResolveContext {
        ResolveContext::new("/work/project", "/home/u").with_repo_root(RepoRoot::Absent)
    }

    #[test]
    fn home_tier_defaults_in_order() {
        let roots = labeled_search_roots(&ctx());
        let labels: Vec<_> = roots.iter().map(|r| r.source.label()).collect();
        assert_eq!(labels, vec!["agents", "agent", "claude", "openclaw", "codex"]);
        assert_eq!(
            skill_search_roots(&ctx()),
            vec![
                PathBuf::from("/home/u/.agents/skills"),
                PathBuf::from("/home/u/.agent/skills"),
                PathBuf::from("/home/u/.claude/skills"),
                PathBuf::from("/home/u/.openclaw/skills"),
                PathBuf::from("/home/u/.codex/skills"),
            ]
        );
    }

    #[test]
    fn env_overrides_replace_home_defaults() {
        /*
        GIVEN every relocation variable set, one of them relative
        WHEN computing search roots
        THEN each default should be replaced and the relative one anchored at cwd
        */
        let ctx = ctx()
            .with_var(ENV_SKILLS_HOME, "/custom/agents")
            .with_var(ENV_CLAUDE_SKILLS_HOME, "rel/claude")
            .with_var(ENV_OPENCLAW_SKILLS_HOME, "/custom/openclaw")
            .with_var(ENV_CODEX_HOME, "/custom/codex");

        assert_eq!(
            skill_search_roots(&ctx),
            vec![
                PathBuf::from("/custom/agents"),
                PathBuf::from("/home/u/.agent/skills"),
                PathBuf::from("/work/project/rel/claude"),
                PathBuf::from("/custom/openclaw"),
                PathBuf::from("/custom/codex/skills"),
            ]
        );
    }

    #[test]
    fn openclaw_state_dir_is_second_choice() {
        let ctx = ctx().with_var(ENV_OPENCLAW_STATE_DIR, "/state");
        assert_eq!(skill_search_roots(&ctx)[3], PathBuf::from("/state/skills"));

        let ctx = ctx.with_var(ENV_OPENCLAW_SKILLS_HOME, "/direct");
        assert_eq!(skill_search_roots(&ctx)[3], PathBuf::from("/direct"));
    }

    #[test]
    fn empty_env_values_count_as_unset() {
        let ctx = ctx().with_var(ENV_SKILLS_HOME, "").with_var(ENV_CODEX_HOME, "");
        let roots = skill_search_roots(&ctx);
        assert_eq!(roots[0], PathBuf::from("/home/u/.agents/skills"));
        assert_eq!(roots[4], PathBuf::from("/home/u/.codex/skills"));
    }

    #[test]
    fn configured_roots_come_first_and_duplicates_collapse() {
        /*
        GIVEN a configured root equal to a home default after normalisation
        WHEN computing search roots
        THEN it should appear once, in its configured position
        */
        let overrides = SkillOverrides::default()
            .with_skill_root("/opt/skills")
            .with_skill_root("/home/u/./.claude/skills");
        let roots = labeled_search_roots(&ctx().with_overrides(overrides));

        assert_eq!(roots[0].path, PathBuf::from("/opt/skills"));
        assert_eq!(roots[0].source, RootSource::Configured(0));
        assert_eq!(roots[1].path, PathBuf::from("/home/u/.claude/skills"));
        assert_eq!(roots[1].source, RootSource::Configured(1));
        assert_eq!(roots.len(), 6);
        assert!(roots.iter().all(|r| r.source != RootSource::Claude));
    }

    #[test]
    fn known_repo_root_adds_repo_dirs_before_home() {
        let ctx = ctx().with_repo_root(RepoRoot::Known(PathBuf::from("/repo")));
        let roots = skill_search_roots(&ctx);
        assert_eq!(
            &roots[..6],
            &[
                PathBuf::from("/repo/.agents/skill"),
                PathBuf::from("/repo/.agent/skills"),
                PathBuf::from("/repo/.agents/skills"),
                PathBuf::from("/repo/.claude/skills"),
                PathBuf::from("/repo/.codex/skills"),
                PathBuf::from("/repo/skills"),
            ]
        );
        assert_eq!(roots[6], PathBuf::from("/home/u/.agents/skills"));
    }

    #[test]
    fn detects_git_repository_root() {
        /*
        GIVEN a git repository with a nested working directory
        WHEN detecting the repository root
        THEN the canonical top-level should be returned
        */
        let tmp = tempdir().unwrap();
        let Some(repo) = init_git_repo(tmp.path()) else {
            eprintln!("git not available; skipping");
            return;
        };
        let nested = repo.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(resolve_repo_root(&nested), Some(repo.clone()));

        let ctx = ResolveContext::new(&nested, tmp.path());
        assert_eq!(skill_search_roots(&ctx)[0], repo.join(".agents/skill"));
    }

    #[test]
    fn outside_repository_has_no_repo_tier() {
        let tmp = tempdir().unwrap();
        if resolve_repo_root(tmp.path()).is_some() {
            // The temp dir itself sits inside a checkout on this machine.
            return;
        }
        let ctx = ResolveContext::new(tmp.path(), "/home/u");
        assert!(labeled_search_roots(&ctx)
            .iter()
            .all(|r| r.source != RootSource::Repo));
    }

    #[test]
    fn candidates_start_with_exact_override() {
        let overrides = SkillOverrides::default().with_skill_path("alpha", "/opt/alpha");
        let ctx = ctx().with_overrides(overrides);

        let candidates = skill_candidate_paths("alpha", &ctx);
        assert_eq!(candidates[0], PathBuf::from("/opt/alpha"));
        assert_eq!(candidates[1], PathBuf::from("/home/u/.agents/skills/alpha"));
        assert_eq!(candidates.len(), 6);

        let other = skill_candidate_paths("beta", &ctx);
        assert_eq!(other[0], PathBuf::from("/home/u/.agents/skills/beta"));
    }

    proptest! {
        #[test]
        fn roots_are_unique_and_stable(
            configured in prop::collection::vec(
                prop::sample::select(vec![
                    "/home/u/.agents/skills",
                    "/home/u/.codex/./skills",
                    "/opt/a",
                    "/opt/a/../a",
                    "/opt/b",
                ]),
                0..6,
            )
        ) {
            let overrides = configured
                .iter()
                .fold(SkillOverrides::default(), |acc, root| acc.with_skill_root(*root));
            let ctx = ctx().with_overrides(overrides);

            let first = skill_search_roots(&ctx);
            let second = skill_search_roots(&ctx);
            prop_assert_eq!(&first, &second);

            let unique: HashSet<_> = first.iter().map(|p| normalize(p)).collect();
            prop_assert_eq!(unique.len(), first.len());
            prop_assert!(first.len() >= 5);
        }
    }
}
