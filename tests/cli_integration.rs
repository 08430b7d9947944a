//! End-to-end tests for the `scm-edit` binary.
//!
//! Each test runs the binary against a throwaway repository. The global
//! config is pinned to a file inside the test directory so the user's own
//! settings never leak in.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_fs::prelude::*;
use git2::{Repository, RepositoryInitOptions, Signature};
use predicates::prelude::*;
use tempfile::TempDir;

struct CliRepo {
    dir: TempDir,
    repo: Repository,
    files: assert_fs::TempDir,
}

impl CliRepo {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo_path = dir.path().join("repo");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(&repo_path, &opts).unwrap();

        {
            let sig = Signature::now("Test User", "test@example.com").unwrap();
            let blob = repo.blob(b"# Test Repo\n").unwrap();
            let mut builder = repo.treebuilder(None).unwrap();
            builder.insert("README.md", blob, 0o100644).unwrap();
            let tree = repo.find_tree(builder.write().unwrap()).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
                .unwrap();
        }

        Self {
            dir,
            repo,
            files: assert_fs::TempDir::new().unwrap(),
        }
    }

    fn repo_path(&self) -> PathBuf {
        self.dir.path().join("repo")
    }

    fn global_config(&self) -> PathBuf {
        self.dir.path().join("global.toml")
    }

    fn write_global_config(&self, content: &str) {
        std::fs::write(self.global_config(), content).unwrap();
    }

    fn write_repo_config(&self, content: &str) {
        let path = self.repo_path().join(".git/scm-edit/config.toml");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn local_file(&self, name: &str, content: &str) -> PathBuf {
        let child = self.files.child(name);
        child.write_str(content).unwrap();
        child.path().to_path_buf()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("scm-edit").unwrap();
        cmd.env("SCM_EDIT_CONFIG", self.global_config())
            .env_remove("RUST_LOG")
            .arg("--repo")
            .arg(self.repo_path())
            .arg("--id")
            .arg("space/repo");
        cmd
    }

    fn tip(&self) -> String {
        self.repo.refname_to_id("refs/heads/main").unwrap().to_string()
    }

    fn read(&self, path: &str) -> Option<String> {
        let commit = self.repo.find_commit(self.repo.refname_to_id("refs/heads/main").ok()?).ok()?;
        let entry = commit.tree().ok()?.get_path(Path::new(path)).ok()?;
        let blob = self.repo.find_blob(entry.id()).ok()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }
}

#[test]
fn upload_commits_local_files() {
    let env = CliRepo::new();
    let intro = env.local_file("intro.md", "intro");
    let setup = env.local_file("setup.md", "setup");

    env.cmd()
        .args(["upload", "--path", "docs"])
        .arg(&intro)
        .arg(&setup)
        .args(["-m", "Add guides", "-b", "main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Add guides"))
        .stdout(predicate::str::contains("branch: main"));

    assert_eq!(env.read("docs/intro.md").as_deref(), Some("intro"));
    assert_eq!(env.read("docs/setup.md").as_deref(), Some("setup"));
}

#[test]
fn quiet_prints_commit_id() {
    let env = CliRepo::new();
    let notes = env.local_file("notes.txt", "n");

    let output = env
        .cmd()
        .arg("upload")
        .arg(&notes)
        .args(["-m", "Notes", "--quiet"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), env.tip());
}

#[test]
fn json_output_is_commit_record() {
    let env = CliRepo::new();
    let notes = env.local_file("notes.txt", "n");

    let output = env
        .cmd()
        .arg("upload")
        .arg(&notes)
        .args(["-m", "Notes", "--json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["id"], env.tip());
    assert_eq!(record["message"], "Notes");
}

#[test]
fn modify_reads_stdin() {
    let env = CliRepo::new();

    env.cmd()
        .args(["modify", "README.md", "-m", "Update readme"])
        .write_stdin("# New\n")
        .assert()
        .success();

    assert_eq!(env.read("README.md").as_deref(), Some("# New\n"));
}

#[test]
fn guard_veto_exits_3() {
    let env = CliRepo::new();
    env.write_repo_config("[guards]\nlocked_branches = [\"main\"]\n");
    let before = env.tip();

    env.cmd()
        .args(["delete", "README.md", "-m", "Remove", "-b", "main"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("prevented"))
        .stderr(predicate::str::contains("main"));

    assert_eq!(env.tip(), before);
}

#[test]
fn locked_head_branch_applies_without_branch_flag() {
    let env = CliRepo::new();
    env.write_repo_config("[guards]\nlocked_branches = [\"main\"]\n");
    let before = env.tip();

    env.cmd()
        .args(["delete", "README.md", "-m", "Remove"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("main"));

    assert_eq!(env.tip(), before);
    assert!(env.read("README.md").is_some());
}

#[test]
fn read_only_repository_exits_4() {
    let env = CliRepo::new();
    env.write_global_config("[permissions]\nread_only = [\"space/repo\"]\n");

    env.cmd()
        .args(["delete", "README.md", "-m", "Remove"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("denied"));
}

#[test]
fn relative_move_target_exits_2() {
    let env = CliRepo::new();

    env.cmd()
        .args(["move", "README.md", "docs/README.md", "-m", "Move"])
        .assert()
        .code(2);

    assert!(env.read("README.md").is_some());
}

#[test]
fn stale_expected_revision_exits_5() {
    let env = CliRepo::new();
    let stale = env.tip();
    let notes = env.local_file("notes.txt", "n");
    env.cmd()
        .arg("upload")
        .arg(&notes)
        .args(["-m", "Notes"])
        .assert()
        .success();

    env.cmd()
        .args(["delete", "README.md", "-m", "Remove", "--expected-revision"])
        .arg(&stale)
        .assert()
        .code(5);

    assert!(env.read("README.md").is_some());
}

#[test]
fn check_reports_without_committing() {
    let env = CliRepo::new();
    env.write_repo_config("[guards]\nprotected_paths = [\"README.md\"]\n");
    let before = env.tip();

    env.cmd()
        .args(["check", "create", "docs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("allowed"));

    env.cmd()
        .args(["check", "modify", "README.md"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("README.md"));

    assert_eq!(env.tip(), before);
}

#[test]
fn editable_at_tip_and_older_revision() {
    let env = CliRepo::new();
    let first = env.tip();
    let notes = env.local_file("notes.txt", "n");
    env.cmd()
        .arg("upload")
        .arg(&notes)
        .args(["-m", "Notes"])
        .assert()
        .success();

    env.cmd()
        .args(["editable", "--quiet"])
        .arg(env.tip())
        .assert()
        .success()
        .stdout("true\n");

    env.cmd()
        .args(["editable", "--quiet"])
        .arg(&first)
        .assert()
        .success()
        .stdout("false\n");
}

#[test]
fn outside_repository_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("not-a-repo");
    std::fs::create_dir_all(&missing).unwrap();

    Command::cargo_bin("scm-edit")
        .unwrap()
        .env("SCM_EDIT_CONFIG", dir.path().join("global.toml"))
        .arg("--repo")
        .arg(&missing)
        .args(["delete", "a.txt", "-m", "msg"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not inside a git repository"));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("scm-edit")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("scm-edit"));
}
