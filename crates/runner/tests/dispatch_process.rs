#![cfg(unix)]

use skillx_discovery::{RepoRoot, ResolveContext};
use skillx_runner::{
    dispatch_skill, PlanOnlyRunner, ProcessRunner, RuntimePlanner, RuntimeProbe, SystemProbe,
};
use skillx_test_utils::{set_mode, SkillFixture};
use std::ffi::OsString;
use std::io;

fn ctx(fixture: &SkillFixture) -> ResolveContext {
    ResolveContext::new(fixture.home(), fixture.home()).with_repo_root(RepoRoot::Absent)
}

#[tokio::test]
async fn shebang_subcommand_exit_code_passes_through() {
    /*
    GIVEN a skill whose `check` subcommand is a shebang script exiting with its first arg
    WHEN dispatching `check 7`
    THEN the child's exit code should come back unchanged
    */
    let fixture = SkillFixture::new().unwrap();
    let scripts = fixture.skill_dir(".agents/skills", "probe").join("scripts");
    std::fs::create_dir_all(&scripts).unwrap();
    let check = scripts.join("check");
    std::fs::write(&check, "#!/bin/sh\nexit \"$1\"\n").unwrap();
    set_mode(&check, 0o755).unwrap();

    let runner = ProcessRunner::new(RuntimePlanner::new());
    let args = vec![OsString::from("check"), OsString::from("7")];
    let report = dispatch_skill("probe", &args, &ctx(&fixture), &runner, &mut io::sink())
        .await
        .unwrap();

    assert_eq!(report.code, 7);
    assert_eq!(report.signal, None);
}

#[tokio::test]
async fn shell_main_runs_under_bash() {
    if !SystemProbe.exists("bash") {
        eprintln!("bash not available; skipping");
        return;
    }
    let fixture = SkillFixture::new().unwrap();
    let scripts = fixture.skill_dir(".agents/skills", "greet").join("scripts");
    std::fs::create_dir_all(&scripts).unwrap();
    std::fs::write(scripts.join("main.sh"), "[ \"$1\" = hello ] && exit 0\nexit 9\n").unwrap();

    let runner = ProcessRunner::new(RuntimePlanner::new());
    let ok = dispatch_skill(
        "greet",
        &[OsString::from("hello")],
        &ctx(&fixture),
        &runner,
        &mut io::sink(),
    )
    .await
    .unwrap();
    assert_eq!(ok.code, 0);

    let other = dispatch_skill(
        "greet",
        &[OsString::from("bye")],
        &ctx(&fixture),
        &runner,
        &mut io::sink(),
    )
    .await
    .unwrap();
    assert_eq!(other.code, 9);
}

#[tokio::test]
async fn dry_run_prints_plan_without_spawning() {
    let fixture = SkillFixture::new().unwrap();
    let scripts = fixture.skill_dir(".agents/skills", "build").join("scripts");
    std::fs::create_dir_all(&scripts).unwrap();
    let main = scripts.join("main.js");
    std::fs::write(&main, "process.exit(1)\n").unwrap();

    let runner = PlanOnlyRunner::new(RuntimePlanner::new().with_node("/opt/node"), Vec::new());
    let report = dispatch_skill(
        "build",
        &[OsString::from("--fast")],
        &ctx(&fixture),
        &runner,
        &mut io::sink(),
    )
    .await
    .unwrap();

    assert_eq!(report.code, 0);
    assert_eq!(
        String::from_utf8(runner.into_inner()).unwrap(),
        format!("/opt/node {} --fast\n", main.display())
    );
}
