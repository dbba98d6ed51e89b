//! End-to-end CLI integration tests
//!
//! These tests invoke the compiled binary as a subprocess to verify
//! that the CLI behaves correctly from a user's perspective. Alignment
//! and promotion scenarios run against scratch git repositories.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Returns a Command configured to run our binary.
///
/// Note: `cargo_bin` is marked deprecated for edge cases involving custom
/// cargo build directories, but works correctly for standard project layouts.
#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

/// Like [`cmd`], but without CI credentials or output paths from the
/// surrounding environment leaking into the run.
fn scrubbed() -> Command {
    let mut command = cmd();
    command.env_remove("GITHUB_OUTPUT");
    command.env_remove("GITHUB_TOKEN");
    command
}

// =============================================================================
// Scratch repository fixtures
// =============================================================================

/// Run a raw git command for fixture setup, panicking on failure.
///
/// Commit and tag dates are pinned so creation-order tag sorting stays
/// deterministic.
fn sh(dir: &Path, args: &[&str]) {
    let status = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_AUTHOR_DATE", "2024-01-01T00:00:00Z")
        .env("GIT_COMMITTER_DATE", "2024-01-01T00:00:00Z")
        .status()
        .expect("failed to run git");
    assert!(status.success(), "git {args:?} failed");
}

/// Run a git command and capture trimmed stdout.
fn git_stdout(dir: &Path, args: &[&str]) -> String {
    let output = std::process::Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(output.status.success(), "git {args:?} failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a scratch repository checked out on the given branch.
fn scratch_repo(branch: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().to_path_buf();
    sh(&dir, &["init", "--quiet"]);
    let reference = format!("refs/heads/{branch}");
    sh(&dir, &["symbolic-ref", "HEAD", &reference]);
    sh(&dir, &["config", "user.name", "test"]);
    sh(&dir, &["config", "user.email", "test@example.com"]);
    sh(&dir, &["config", "commit.gpgsign", "false"]);
    sh(&dir, &["config", "tag.gpgsign", "false"]);
    (tmp, dir)
}

fn commit(dir: &Path, message: &str) {
    sh(dir, &["commit", "--allow-empty", "-m", message]);
}

fn head_message(dir: &Path) -> String {
    git_stdout(dir, &["log", "-1", "--format=%B"])
}

fn commit_count(dir: &Path) -> usize {
    git_stdout(dir, &["rev-list", "--count", "HEAD"])
        .parse()
        .unwrap()
}

/// Add a local bare repository under the given remote name.
fn add_bare_remote(dir: &Path, name: &str) -> TempDir {
    let remote = TempDir::new().unwrap();
    sh(remote.path(), &["init", "--quiet", "--bare"]);
    sh(
        dir,
        &["remote", "add", name, remote.path().to_str().unwrap()],
    );
    remote
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_shows_usage() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("Options:"));
}

#[test]
fn short_help_flag_shows_usage() {
    cmd()
        .arg("-h")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn version_flag_shows_version() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn short_version_flag_shows_version() {
    cmd()
        .arg("-V")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn align_help_shows_command_options() {
    cmd()
        .args(["align", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--target-ref"))
        .stdout(predicate::str::contains("--remote"))
        .stdout(predicate::str::contains("--github-output"))
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--no-push"));
}

#[test]
fn promote_help_shows_command_options() {
    cmd()
        .args(["promote", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--stable-ref"))
        .stdout(predicate::str::contains("--github-output"))
        .stdout(predicate::str::contains("--dry-run"));
}

// =============================================================================
// Global Flags
// =============================================================================

#[test]
fn quiet_flag_accepted() {
    cmd().args(["--quiet", "doctor"]).assert().success();
}

#[test]
fn short_quiet_flag_accepted() {
    cmd().args(["-q", "doctor"]).assert().success();
}

#[test]
fn verbose_flag_accepted() {
    cmd().args(["--verbose", "doctor"]).assert().success();
}

#[test]
fn multiple_verbose_flags_accepted() {
    cmd().args(["-vv", "doctor"]).assert().success();
}

#[test]
fn color_never_accepted() {
    cmd().args(["--color", "never", "doctor"]).assert().success();
}

// =============================================================================
// Error Cases
// =============================================================================

#[test]
fn no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn invalid_subcommand_shows_error() {
    cmd()
        .arg("not-a-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn invalid_flag_shows_error() {
    cmd()
        .arg("--not-a-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn chdir_nonexistent_fails() {
    cmd()
        .args(["-C", "/nonexistent/path/that/does/not/exist", "doctor"])
        .assert()
        .failure();
}

// =============================================================================
// Align
// =============================================================================

#[test]
fn align_fix_bumps_rc_and_writes_output() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.1-rc.1"]);
    commit(&dir, "fix: null check");

    let out = TempDir::new().unwrap();
    let out_file = out.path().join("outputs");

    scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "align",
            "--no-push",
            "--github-output",
            out_file.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(head_message(&dir).contains("Release-As: 0.1.1-rc.2"));
    let outputs = fs::read_to_string(&out_file).unwrap();
    assert_eq!(outputs, "next_version=0.1.1-rc.2\n");
}

#[test]
fn align_feature_starts_new_minor_train() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.1-rc.1"]);
    commit(&dir, "feat: add widget");
    commit(&dir, "docs: update readme");

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align", "--no-push"])
        .assert()
        .success();

    // Patch carries over unchanged; only the rc counter resets.
    assert!(head_message(&dir).contains("Release-As: 0.2.1-rc.0"));
}

#[test]
fn align_breaking_change_skips_with_empty_output() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.1-rc.1"]);
    commit(&dir, "fix: x");
    commit(&dir, "BREAKING CHANGE: remove endpoint");

    let before = commit_count(&dir);
    let out = TempDir::new().unwrap();
    let out_file = out.path().join("outputs");

    scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "align",
            "--github-output",
            out_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));

    assert_eq!(commit_count(&dir), before);
    let outputs = fs::read_to_string(&out_file).unwrap();
    assert_eq!(outputs, "next_version=\n");
}

#[test]
fn align_without_rc_tag_skips() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "feat: first work");

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));
}

#[test]
fn align_off_target_branch_skips() {
    let (_tmp, dir) = scratch_repo("main");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.0-rc.0"]);
    commit(&dir, "fix: something");

    let before = commit_count(&dir);
    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));
    assert_eq!(commit_count(&dir), before);
}

#[test]
fn align_target_ref_flag_overrides_gate() {
    let (_tmp, dir) = scratch_repo("canary");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v1.0.0-rc.0"]);
    commit(&dir, "fix: something");

    scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "align",
            "--no-push",
            "--target-ref",
            "refs/heads/canary",
        ])
        .assert()
        .success();

    assert!(head_message(&dir).contains("Release-As: 1.0.0-rc.1"));
}

#[test]
fn align_rerun_is_idempotent() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v1.0.0-rc.3"]);
    commit(&dir, "chore: bump deps");

    let align = |expect_skip: bool| {
        let assert = scrubbed()
            .args(["-C", dir.to_str().unwrap(), "align", "--no-push"])
            .assert()
            .success();
        if expect_skip {
            assert.stdout(predicate::str::contains("Skipped"));
        }
    };

    align(false);
    let after_first = commit_count(&dir);
    assert!(head_message(&dir).contains("Release-As: 1.0.0-rc.4"));

    // Second run sees its own marker and declines to stack another.
    align(true);
    assert_eq!(commit_count(&dir), after_first);
}

#[test]
fn align_pushes_marker_to_remote() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.0-rc.0"]);
    commit(&dir, "fix: follow-up");
    let remote = add_bare_remote(&dir, "origin");

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align"])
        .assert()
        .success();

    let pushed = git_stdout(remote.path(), &["log", "next", "-1", "--format=%B"]);
    assert!(pushed.contains("Release-As: 0.1.0-rc.1"));
}

#[test]
fn align_remote_flag_overrides_push_target() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.0-rc.0"]);
    commit(&dir, "fix: follow-up");
    let upstream = add_bare_remote(&dir, "upstream");

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align", "--remote", "upstream"])
        .assert()
        .success();

    let pushed = git_stdout(upstream.path(), &["log", "next", "-1", "--format=%B"]);
    assert!(pushed.contains("Release-As: 0.1.0-rc.1"));
}

#[test]
fn align_push_failure_is_fatal() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.0-rc.0"]);
    commit(&dir, "fix: follow-up");
    // No origin configured, so the push must fail the run.

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align"])
        .assert()
        .failure();
}

#[test]
fn align_malformed_tag_is_fatal() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v1.2-rc.1"]);
    commit(&dir, "fix: follow-up");

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alignment planning failed"));
}

#[test]
fn align_dry_run_makes_no_changes() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.1-rc.1"]);
    commit(&dir, "fix: null check");

    let before = commit_count(&dir);
    let out = TempDir::new().unwrap();
    let out_file = out.path().join("outputs");

    scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "align",
            "--dry-run",
            "--github-output",
            out_file.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(commit_count(&dir), before);
    assert!(!out_file.exists());
}

#[test]
fn align_json_dry_run_reports_plan() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.1-rc.1"]);
    commit(&dir, "feat: add widget");

    let output = scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "align",
            "--json",
            "--dry-run",
        ])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("align --json should output valid JSON");
    assert_eq!(json["status"], "planned");
    assert_eq!(json["next_version"], "0.2.1-rc.0");
    assert_eq!(json["classification"], "feature");
}

#[test]
fn align_json_skip_names_the_reason() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.0-rc.0"]);
    commit(&dir, "refactor: core\n\nBREAKING CHANGE: renamed fields");

    let output = scrubbed()
        .args(["-C", dir.to_str().unwrap(), "align", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["status"], "skipped");
    assert_eq!(json["reason"]["kind"], "breaking-change");
}

#[test]
fn align_output_path_from_environment() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v0.1.0-rc.0"]);
    commit(&dir, "fix: follow-up");

    let out = TempDir::new().unwrap();
    let out_file = out.path().join("github_output");

    scrubbed()
        .env("GITHUB_OUTPUT", out_file.to_str().unwrap())
        .args(["-C", dir.to_str().unwrap(), "align", "--no-push"])
        .assert()
        .success();

    let outputs = fs::read_to_string(&out_file).unwrap();
    assert_eq!(outputs, "next_version=0.1.0-rc.1\n");
}

// =============================================================================
// Promote
// =============================================================================

#[test]
fn promote_strips_candidate_suffix() {
    let (_tmp, dir) = scratch_repo("main");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v1.2.3-rc.4"]);

    let out = TempDir::new().unwrap();
    let out_file = out.path().join("outputs");

    scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "promote",
            "--github-output",
            out_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.3"));

    let outputs = fs::read_to_string(&out_file).unwrap();
    assert_eq!(outputs, "next_version=1.2.3\n");
}

#[test]
fn promote_first_release_without_tags() {
    let (_tmp, dir) = scratch_repo("main");
    commit(&dir, "chore: init");

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "promote"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1.0"));
}

#[test]
fn promote_skips_off_stable_refs() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v1.0.0-rc.2"]);

    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "promote"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"));
}

#[test]
fn promote_stable_ref_flag_overrides_gate() {
    let (_tmp, dir) = scratch_repo("release");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v2.0.0-rc.1"]);

    scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "promote",
            "--stable-ref",
            "refs/heads/release",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2.0.0"));
}

#[test]
fn promote_dry_run_skips_output_write() {
    let (_tmp, dir) = scratch_repo("main");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v1.2.3-rc.4"]);

    let out = TempDir::new().unwrap();
    let out_file = out.path().join("outputs");

    scrubbed()
        .args([
            "-C",
            dir.to_str().unwrap(),
            "promote",
            "--dry-run",
            "--github-output",
            out_file.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.2.3"))
        .stdout(predicate::str::contains("Dry run"));

    assert!(!out_file.exists());
}

#[test]
fn promote_never_commits() {
    let (_tmp, dir) = scratch_repo("main");
    commit(&dir, "chore: init");
    sh(&dir, &["tag", "v1.0.0-rc.0"]);

    let before = commit_count(&dir);
    scrubbed()
        .args(["-C", dir.to_str().unwrap(), "promote"])
        .assert()
        .success();
    assert_eq!(commit_count(&dir), before);
}

// =============================================================================
// Doctor
// =============================================================================

#[test]
fn doctor_json_outputs_valid_json() {
    let (_tmp, dir) = scratch_repo("next");
    commit(&dir, "chore: init");

    let output = scrubbed()
        .args(["-C", dir.to_str().unwrap(), "doctor", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    let json: serde_json::Value =
        serde_json::from_str(&stdout).expect("doctor --json should output valid JSON");

    assert_eq!(json["git"]["inside_repo"], true);
    assert_eq!(json["git"]["current_ref"], "refs/heads/next");
}

#[test]
fn doctor_never_echoes_the_token() {
    let output = scrubbed()
        .env("GITHUB_TOKEN", "hunter2-super-secret")
        .args(["-C", "/tmp", "doctor", "--json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&output.get_output().stdout);
    assert!(!stdout.contains("hunter2-super-secret"));
    assert!(stdout.contains("GITHUB_TOKEN"));
}
