//! cli
//!
//! Command-line interface for scm-edit.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Assemble the editor from configuration (guards, permissions, author)
//! - Delegate to command handlers and map failures to exit codes
//!
//! # Architecture
//!
//! The CLI layer is thin. Every change goes through
//! [`crate::editor::EditorService`]; handlers only translate arguments and
//! format results.
//!
//! # Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Repository or internal failure |
//! | 2 | Invalid input, or a local file could not be read |
//! | 3 | Change vetoed by guards |
//! | 4 | Write not permitted |
//! | 5 | Branch moved (expected revision mismatch or concurrent update) |

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::debug;

use crate::auth::ReadOnlyRepositories;
use crate::core::config::Config;
use crate::core::types::{RepoId, TypeError};
use crate::editor::{EditorError, EditorPreconditions, EditorService};
use crate::guard::GuardCheck;
use crate::repo::git::{self, GitRepositoryServiceFactory};
use crate::ui::output::Verbosity;

/// Namespace used when the repository directory has no usable parent name.
pub const DEFAULT_NAMESPACE: &str = "local";

/// Global options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Repository path from `--repo`
    pub repo: Option<PathBuf>,
    /// Repository identity from `--id`
    pub id: Option<String>,
    pub debug: bool,
    pub quiet: bool,
    pub json: bool,
}

impl Context {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.debug)
    }

    /// Locate the repository and build the editor for it.
    pub fn session(&self) -> Result<Session> {
        let start = match &self.repo {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("failed to read current directory")?,
        };
        let root = git::discover(&start)
            .with_context(|| format!("not inside a git repository: {}", start.display()))?;

        let repository = match &self.id {
            Some(id) => id
                .parse::<RepoId>()
                .with_context(|| format!("invalid --id '{id}'"))?,
            None => default_id(&root).context("pass --id <namespace/name>")?,
        };

        let config = Config::load(Some(root.as_path()))
            .context("failed to load configuration")?
            .config;
        let default_branch = git::head_branch(&root).context("failed to read HEAD")?;
        let guards = GuardCheck::from_config(&config.guards(), default_branch.as_ref())
            .context("invalid guard settings")?;
        let permissions = Arc::new(ReadOnlyRepositories::new(config.read_only_repositories()));
        let factory = Arc::new(
            GitRepositoryServiceFactory::new()
                .with_repository(repository.clone(), &root)
                .with_author(config.author().cloned()),
        );

        debug!(%repository, root = %root.display(), guards = guards.len(), "session ready");
        Ok(Session {
            editor: EditorService::new(factory.clone(), guards, permissions.clone()),
            preconditions: EditorPreconditions::new(factory, permissions),
            repository,
            root,
        })
    }
}

/// Everything a command needs to act on one repository.
#[derive(Clone)]
pub struct Session {
    pub repository: RepoId,
    pub root: PathBuf,
    pub editor: EditorService,
    pub preconditions: EditorPreconditions,
}

/// Derive `<parent>/<dir>` from a repository root, dropping a `.git` suffix.
pub fn default_id(root: &Path) -> Result<RepoId, TypeError> {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = name.strip_suffix(".git").unwrap_or(&name).to_string();
    let namespace = root
        .parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

    RepoId::new(namespace, name.clone())
        .or_else(|_| RepoId::new(DEFAULT_NAMESPACE, name))
}

/// Map a command failure to the process exit code.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(editor) = cause.downcast_ref::<EditorError>() {
            return match editor {
                e if e.is_client_error() => 2,
                EditorError::NotAllowed(_) => 3,
                EditorError::Permission(_) => 4,
                e if e.is_conflict() => 5,
                _ => 1,
            };
        }
        if cause.downcast_ref::<TypeError>().is_some() {
            return 2;
        }
    }
    1
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context {
        repo: cli.repo.clone(),
        id: cli.id.clone(),
        debug: cli.debug,
        quiet: cli.quiet,
        json: cli.json,
    };

    commands::dispatch(cli.command, &ctx)
}
