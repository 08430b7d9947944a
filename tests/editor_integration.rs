//! Integration tests for the editor against real git repositories.
//!
//! Every test builds a fresh repository with one commit on `main` and drives
//! it through `EditorService`, then inspects the result with `git2`.

use std::path::Path;
use std::sync::Arc;

use git2::{Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

use scm_editor::auth::{AllowAll, ReadOnlyRepositories};
use scm_editor::core::config::{AuthorConfig, Config, GuardsConfig};
use scm_editor::core::types::{BranchName, RepoId, Revision};
use scm_editor::editor::{EditorError, EditorPreconditions, EditorService};
use scm_editor::guard::GuardCheck;
use scm_editor::repo::git::{self, GitRepositoryServiceFactory};
use scm_editor::repo::RepoError;

// =============================================================================
// Test Fixtures
// =============================================================================

/// A repository with `README.md` committed on `main`.
struct TestRepo {
    dir: TempDir,
    repo: Repository,
    id: RepoId,
}

impl TestRepo {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(dir.path(), &opts).expect("failed to init repo");

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
            id: RepoId::new("space", "repo").unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn factory(&self) -> Arc<GitRepositoryServiceFactory> {
        Arc::new(
            GitRepositoryServiceFactory::new()
                .with_repository(self.id.clone(), self.path())
                .with_author(Some(AuthorConfig {
                    name: "Editor".into(),
                    email: "editor@example.com".into(),
                })),
        )
    }

    fn editor(&self, guards: GuardCheck) -> EditorService {
        EditorService::new(self.factory(), guards, Arc::new(AllowAll))
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

    fn commit_count(&self) -> usize {
        let mut walk = self.repo.revwalk().unwrap();
        walk.push_ref("refs/heads/main").unwrap();
        walk.count()
    }
}

fn main_branch() -> BranchName {
    BranchName::new("main").unwrap()
}

fn guards(config: GuardsConfig) -> GuardCheck {
    GuardCheck::from_config(&config, None).unwrap()
}

// =============================================================================
// Batches
// =============================================================================

#[test]
fn batch_lands_as_one_commit() {
    let repo = TestRepo::new();
    let editor = repo.editor(GuardCheck::empty());

    let mut batch = editor
        .prepare(&repo.id, Some(&main_branch()), "docs", "Add guides", None)
        .unwrap();
    batch
        .create("intro.md", &b"intro"[..])
        .unwrap()
        .create("setup.md", &b"setup"[..])
        .unwrap();
    let record = batch.finalize().unwrap();

    assert_eq!(repo.commit_count(), 2);
    assert_eq!(record.id, repo.tip());
    assert_eq!(record.message, "Add guides");
    assert_eq!(record.author.email, "editor@example.com");
    assert_eq!(record.branch, Some(main_branch()));
    assert_eq!(repo.read("docs/intro.md").as_deref(), Some("intro"));
    assert_eq!(repo.read("docs/setup.md").as_deref(), Some("setup"));
    assert_eq!(repo.read("README.md").as_deref(), Some("# Test Repo\n"));
}

#[test]
fn working_tree_is_never_touched() {
    let repo = TestRepo::new();
    let editor = repo.editor(GuardCheck::empty());

    editor
        .create_file(&repo.id, None, "", "notes.txt", &b"n"[..], "Notes", None)
        .unwrap();

    assert_eq!(repo.read("notes.txt").as_deref(), Some("n"));
    assert!(!repo.path().join("notes.txt").exists());
}

#[test]
fn modify_replaces_content() {
    let repo = TestRepo::new();
    let editor = repo.editor(GuardCheck::empty());

    editor
        .modify_file(&repo.id, None, "README.md", &b"# Changed\n"[..], "Update readme", None)
        .unwrap();

    assert_eq!(repo.read("README.md").as_deref(), Some("# Changed\n"));
}

#[test]
fn modify_of_missing_file_fails_without_commit() {
    let repo = TestRepo::new();
    let before = repo.tip();
    let editor = repo.editor(GuardCheck::empty());

    let err = editor
        .modify_file(&repo.id, None, "missing.md", &b"x"[..], "msg", None)
        .unwrap_err();

    assert!(matches!(
        err,
        EditorError::RepositoryAccess {
            source: RepoError::PathNotFound(_),
            ..
        }
    ));
    assert_eq!(repo.tip(), before);
}

// =============================================================================
// Guards and permissions
// =============================================================================

#[test]
fn protected_path_vetoes_whole_batch() {
    let repo = TestRepo::new();
    let before = repo.tip();
    let editor = repo.editor(guards(GuardsConfig {
        protected_paths: vec!["docs/secret/**".into()],
        ..Default::default()
    }));

    let mut batch = editor.prepare(&repo.id, None, "docs", "msg", None).unwrap();
    batch.create("ok.md", &b"ok"[..]).unwrap();
    batch.create("secret/keys.md", &b"no"[..]).unwrap();
    let err = batch.finalize().unwrap_err();

    let obstacles = err.obstacles().expect("vetoed");
    assert_eq!(obstacles.len(), 1);
    assert_eq!(repo.tip(), before);
    assert_eq!(repo.read("docs/ok.md"), None);
}

#[test]
fn file_limit_counts_the_batch() {
    let repo = TestRepo::new();
    let editor = repo.editor(guards(GuardsConfig {
        max_files_per_commit: Some(1),
        ..Default::default()
    }));

    let mut batch = editor.prepare(&repo.id, None, "", "msg", None).unwrap();
    batch.create("a.txt", &b"a"[..]).unwrap();
    batch.create("b.txt", &b"b"[..]).unwrap();
    assert!(matches!(
        batch.finalize().unwrap_err(),
        EditorError::NotAllowed(_)
    ));
    assert_eq!(repo.commit_count(), 1);
}

#[test]
fn locked_branch_blocks_delete() {
    let repo = TestRepo::new();
    let editor = repo.editor(guards(GuardsConfig {
        locked_branches: vec!["main".into()],
        ..Default::default()
    }));

    let err = editor
        .delete(&repo.id, Some(&main_branch()), "README.md", "msg", None)
        .unwrap_err();
    assert!(matches!(err, EditorError::NotAllowed(_)));
    assert!(repo.read("README.md").is_some());
}

#[test]
fn locked_head_branch_blocks_unnamed_branch() {
    let repo = TestRepo::new();
    let before = repo.tip();
    let head = git::head_branch(repo.path()).unwrap();
    assert_eq!(head, Some(main_branch()));
    let editor = repo.editor(
        GuardCheck::from_config(
            &GuardsConfig {
                locked_branches: vec!["main".into()],
                ..Default::default()
            },
            head.as_ref(),
        )
        .unwrap(),
    );

    let err = editor
        .create_file(&repo.id, None, "", "notes.txt", &b"n"[..], "msg", None)
        .unwrap_err();
    assert!(matches!(err, EditorError::NotAllowed(_)));
    assert_eq!(repo.tip(), before);
    assert_eq!(repo.read("notes.txt"), None);
}

#[test]
fn protected_file_blocks_parent_directory_delete() {
    let repo = TestRepo::new();
    let seeding = repo.editor(GuardCheck::empty());
    let mut batch = seeding.prepare(&repo.id, None, "docs", "seed", None).unwrap();
    batch.create("LICENSE", &b"MIT"[..]).unwrap();
    batch.create("guide.md", &b"guide"[..]).unwrap();
    batch.finalize().unwrap();
    let before = repo.tip();

    let editor = repo.editor(guards(GuardsConfig {
        protected_paths: vec!["docs/LICENSE".into()],
        ..Default::default()
    }));
    let err = editor
        .delete(&repo.id, None, "docs", "Remove docs", None)
        .unwrap_err();

    let obstacles = err.obstacles().expect("vetoed");
    assert_eq!(obstacles.len(), 1);
    assert_eq!(repo.tip(), before);
    assert_eq!(repo.read("docs/LICENSE").as_deref(), Some("MIT"));

    editor
        .delete(&repo.id, None, "docs/guide.md", "Remove guide", None)
        .unwrap();
    assert_eq!(repo.read("docs/guide.md"), None);
}

#[test]
fn read_only_repository_is_refused() {
    let repo = TestRepo::new();
    let editor = EditorService::new(
        repo.factory(),
        GuardCheck::empty(),
        Arc::new(ReadOnlyRepositories::new([repo.id.clone()])),
    );

    let err = editor
        .create_file(&repo.id, None, "", "a.txt", &b"a"[..], "msg", None)
        .unwrap_err();
    assert!(matches!(err, EditorError::Permission(_)));
    assert_eq!(repo.commit_count(), 1);
}

#[test]
fn repository_config_feeds_guards() {
    let repo = TestRepo::new();
    let config_path = Config::repo_config_path(repo.path());
    std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
    std::fs::write(&config_path, "[guards]\nprotected_paths = [\"README.md\"]\n").unwrap();

    let config = Config::load_from(None, Some(repo.path())).unwrap().config;
    let editor = repo.editor(GuardCheck::from_config(&config.guards(), None).unwrap());

    let obstacles = editor.is_modifiable(&repo.id, None, "README.md").unwrap();
    assert_eq!(obstacles.len(), 1);
    assert!(editor.is_modifiable(&repo.id, None, "other.md").unwrap().is_empty());
}

// =============================================================================
// Delete and move
// =============================================================================

#[test]
fn delete_directory_removes_everything_below() {
    let repo = TestRepo::new();
    let editor = repo.editor(GuardCheck::empty());
    let mut batch = editor.prepare(&repo.id, None, "old", "seed", None).unwrap();
    batch.create("a.txt", &b"a"[..]).unwrap();
    batch.create("b.txt", &b"b"[..]).unwrap();
    batch.finalize().unwrap();

    editor.delete(&repo.id, None, "old", "Remove old", None).unwrap();

    assert_eq!(repo.read("old/a.txt"), None);
    assert_eq!(repo.read("old/b.txt"), None);
    assert!(repo.read("README.md").is_some());
    assert_eq!(repo.commit_count(), 3);
}

#[test]
fn create_below_existing_file_keeps_file() {
    let repo = TestRepo::new();
    let before = repo.tip();
    let editor = repo.editor(GuardCheck::empty());

    let mut batch = editor
        .prepare(&repo.id, None, "README.md", "msg", None)
        .unwrap();
    batch.create("inner.md", &b"inner"[..]).unwrap();
    let err = batch.finalize().unwrap_err();

    assert!(matches!(
        err,
        EditorError::RepositoryAccess {
            source: RepoError::AlreadyExists(ref path),
            ..
        } if path == "README.md"
    ));
    assert_eq!(repo.tip(), before);
    assert_eq!(repo.read("README.md").as_deref(), Some("# Test Repo\n"));
}

#[test]
fn move_renames_file() {
    let repo = TestRepo::new();
    let editor = repo.editor(GuardCheck::empty());

    let record = editor
        .move_file(&repo.id, None, "README.md", "/docs/README.md", "Move readme")
        .unwrap();

    assert_eq!(record.id, repo.tip());
    assert_eq!(repo.read("README.md"), None);
    assert_eq!(repo.read("docs/README.md").as_deref(), Some("# Test Repo\n"));
}

#[test]
fn move_target_must_be_absolute() {
    let repo = TestRepo::new();
    let editor = repo.editor(GuardCheck::empty());

    let err = editor
        .move_file(&repo.id, None, "README.md", "docs/README.md", "msg")
        .unwrap_err();
    assert!(matches!(err, EditorError::Validation(_)));
    assert_eq!(repo.commit_count(), 1);
}

// =============================================================================
// Revisions
// =============================================================================

#[test]
fn stale_expected_revision_is_conflict() {
    let repo = TestRepo::new();
    let stale = Revision::new(repo.tip()).unwrap();
    let editor = repo.editor(GuardCheck::empty());
    editor
        .create_file(&repo.id, None, "", "a.txt", &b"a"[..], "first", None)
        .unwrap();
    let tip = repo.tip();

    let err = editor
        .create_file(&repo.id, None, "", "b.txt", &b"b"[..], "second", Some(&stale))
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(repo.tip(), tip);
}

#[test]
fn abbreviated_expected_revision_is_accepted() {
    let repo = TestRepo::new();
    let short = Revision::new(&repo.tip()[..10]).unwrap();
    let editor = repo.editor(GuardCheck::empty());

    editor
        .create_file(&repo.id, None, "", "a.txt", &b"a"[..], "msg", Some(&short))
        .unwrap();
    assert_eq!(repo.commit_count(), 2);
}

#[test]
fn only_branch_tips_are_editable() {
    let repo = TestRepo::new();
    let first = repo.tip();
    let editor = repo.editor(GuardCheck::empty());
    editor
        .create_file(&repo.id, None, "", "a.txt", &b"a"[..], "msg", None)
        .unwrap();

    let preconditions = EditorPreconditions::new(repo.factory(), Arc::new(AllowAll));
    assert!(preconditions.is_editable(&repo.id, None).unwrap());
    assert!(preconditions
        .is_editable(&repo.id, Some(&Revision::new(repo.tip()).unwrap()))
        .unwrap());
    assert!(!preconditions
        .is_editable(&repo.id, Some(&Revision::new(first).unwrap()))
        .unwrap());
}

#[test]
fn unknown_branch_is_reported() {
    let repo = TestRepo::new();
    let editor = repo.editor(GuardCheck::empty());
    let branch = BranchName::new("nope").unwrap();

    let err = editor
        .create_file(&repo.id, Some(&branch), "", "a.txt", &b"a"[..], "msg", None)
        .unwrap_err();
    assert!(matches!(
        err,
        EditorError::RepositoryAccess {
            source: RepoError::BranchNotFound(_),
            ..
        }
    ));
}
