//! Integration tests for the `skillforge init` command.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn make_share() -> TempDir {
    let share = TempDir::new().unwrap();
    for name in ["writer", "reviewer"] {
        let dir = share.path().join("skills").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {name} skill\n---\nbody\n"),
        )
        .unwrap();
    }
    share
}

fn cmd(project: &Path, share: &Path) -> Command {
    let mut cmd = Command::cargo_bin("skillforge").unwrap();
    cmd.current_dir(project).env("SKILLFORGE_SHARE_DIR", share);
    cmd
}

#[test]
fn test_init_installs_skills_and_writes_config() {
    let project = TempDir::new().unwrap();
    let share = make_share();

    cmd(project.path(), share.path())
        .args(["init", "--agents", "claude"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Setup complete"))
        .stdout(predicate::str::contains("Installed skills: 2"));

    assert!(project.path().join(".skillforge.json").is_file());
    assert!(project.path().join(".claude/skills/writer/SKILL.md").is_file());
    assert!(project.path().join(".claude/skills/reviewer/SKILL.md").is_file());
}

#[test]
fn test_init_skill_selection() {
    let project = TempDir::new().unwrap();
    let share = make_share();

    cmd(project.path(), share.path())
        .args(["init", "--agents", "claude", "--skills", "writer"])
        .assert()
        .success();

    assert!(project.path().join(".claude/skills/writer").exists());
    assert!(!project.path().join(".claude/skills/reviewer").exists());
}

#[test]
fn test_reinit_removes_deselected_agent() {
    let project = TempDir::new().unwrap();
    let share = make_share();

    cmd(project.path(), share.path())
        .args(["init", "--agents", "claude,codex"])
        .assert()
        .success();
    assert!(project.path().join(".codex/skills/writer").exists());

    cmd(project.path(), share.path())
        .args(["init", "--agents", "claude"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed: codex"));
    assert!(!project.path().join(".codex/skills").exists());
    assert!(project.path().join(".claude/skills/writer").exists());
}

#[test]
fn test_kilocode_gets_flat_rules() {
    let project = TempDir::new().unwrap();
    let share = make_share();

    cmd(project.path(), share.path())
        .args(["init", "--agents", "kilocode", "--skills", "writer"])
        .assert()
        .success();

    assert!(project.path().join(".kilocode/rules/writer.md").is_file());
}

#[test]
fn test_update_without_config_fails() {
    let project = TempDir::new().unwrap();
    let share = make_share();

    cmd(project.path(), share.path())
        .arg("update")
        .assert()
        .failure()
        .stderr(predicate::str::contains(".skillforge.json"));
}

#[test]
fn test_update_installs_new_catalog_skill() {
    let project = TempDir::new().unwrap();
    let share = make_share();

    cmd(project.path(), share.path())
        .args(["init", "--agents", "claude", "--skills", "writer"])
        .assert()
        .success();

    // After init, the catalog still ships "reviewer"; update picks it up.
    cmd(project.path(), share.path())
        .arg("update")
        .assert()
        .success()
        .stdout(predicate::str::contains("New skills: reviewer"));

    assert!(project.path().join(".claude/skills/reviewer/SKILL.md").is_file());
}
