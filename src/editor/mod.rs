//! editor
//!
//! The editing service: guarded, atomic file changes as commits.
//!
//! # Architecture
//!
//! [`EditorService`] is stateless. It validates input, consults the guards,
//! checks write permission and opens a repository connection. State lives in
//! the [`FileUploader`] batch it hands out, or is confined to one call for
//! the immediate operations (`delete`, `move_file`).
//!
//! # Ordering
//!
//! Every operation checks in this order and stops at the first failure:
//!
//! 1. Structural validation of message and paths
//! 2. Guards (delete only; batches consult them at finalize)
//! 3. Write permission
//! 4. Repository connection and commit
//!
//! Invalid input therefore never reaches a guard or a repository, and a
//! vetoed delete never opens a connection.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use scm_editor::auth::AllowAll;
//! use scm_editor::core::types::RepoId;
//! use scm_editor::editor::EditorService;
//! use scm_editor::guard::GuardCheck;
//! use scm_editor::repo::mock::MockRepositoryFactory;
//!
//! let factory = MockRepositoryFactory::new();
//! let editor = EditorService::new(Arc::new(factory.clone()), GuardCheck::empty(), Arc::new(AllowAll));
//! let repo = RepoId::new("space", "repo").unwrap();
//!
//! let mut batch = editor.prepare(&repo, None, "docs", "Add guides", None).unwrap();
//! batch
//!     .create("intro.md", &b"# Intro\n"[..])
//!     .unwrap()
//!     .create("setup.md", &b"# Setup\n"[..])
//!     .unwrap();
//! let commit = batch.finalize().unwrap();
//!
//! assert_eq!(commit.message, "Add guides");
//! assert_eq!(factory.executed().len(), 1);
//! ```

pub mod errors;
pub mod preconditions;
pub mod uploader;

pub use errors::{ChangeNotAllowed, EditorError};
pub use preconditions::EditorPreconditions;
pub use uploader::FileUploader;

use std::io::Read;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::Permissions;
use crate::core::types::{BranchName, RepoId, Revision};
use crate::core::validation::{
    split_path, validate_file_name, validate_file_path, validate_move_target, validate_not_empty,
    validate_path, validate_required_path,
};
use crate::guard::{GuardCheck, Obstacles};
use crate::repo::{CommitRecord, Modification, RepositoryService, RepositoryServiceFactory};

/// Stateless entry point for all editing operations.
#[derive(Clone)]
pub struct EditorService {
    factory: Arc<dyn RepositoryServiceFactory>,
    guards: GuardCheck,
    permissions: Arc<dyn Permissions>,
}

impl std::fmt::Debug for EditorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorService")
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

impl EditorService {
    pub fn new(
        factory: Arc<dyn RepositoryServiceFactory>,
        guards: GuardCheck,
        permissions: Arc<dyn Permissions>,
    ) -> Self {
        Self {
            factory,
            guards,
            permissions,
        }
    }

    /// The registered guards.
    pub fn guards(&self) -> &GuardCheck {
        &self.guards
    }

    /// Start a batch of changes under `path` (empty for the repository root).
    ///
    /// # Errors
    ///
    /// - [`EditorError::Validation`] if the message is empty or the path unsafe
    /// - [`EditorError::Permission`] if writing is not permitted
    /// - [`EditorError::RepositoryAccess`] if the repository cannot be opened
    pub fn prepare(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
        message: &str,
        expected_revision: Option<&Revision>,
    ) -> Result<FileUploader, EditorError> {
        validate_not_empty(message, "commit message")?;
        validate_path(path, "path")?;
        self.permissions.check_write(repository)?;

        let service = self.open(repository, branch)?;
        let mut modification = Modification::new();
        modification
            .set_branch(branch.cloned())
            .set_expected_revision(expected_revision.cloned())
            .set_commit_message(message);

        debug!(
            %repository,
            branch = branch.map(BranchName::as_str),
            path,
            "prepared batch"
        );
        Ok(FileUploader::new(
            service,
            self.guards.clone(),
            modification,
            path.to_string(),
        ))
    }

    /// Delete a file or directory in one commit.
    ///
    /// Guards are asked before anything else touches the repository; a veto
    /// opens no connection.
    pub fn delete(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
        message: &str,
        expected_revision: Option<&Revision>,
    ) -> Result<CommitRecord, EditorError> {
        validate_not_empty(message, "commit message")?;
        validate_required_path(path, "path")?;

        let obstacles = self.guards.is_deletable(repository, branch, path)?;
        if !obstacles.is_empty() {
            warn!(%repository, path, obstacles = obstacles.len(), "delete vetoed by guards");
            return Err(ChangeNotAllowed {
                repository: repository.clone(),
                branch: branch.cloned(),
                path: path.to_string(),
                obstacles,
            }
            .into());
        }

        self.permissions.check_write(repository)?;
        let mut service = self.open(repository, branch)?;
        let mut modification = Modification::new();
        modification
            .set_branch(branch.cloned())
            .set_expected_revision(expected_revision.cloned())
            .set_commit_message(message)
            .delete_file(path);

        uploader::commit(service.as_mut(), &modification)
    }

    /// Move or rename a file or directory in one commit.
    ///
    /// `to` must start with `/`. Moves are not submitted to guards and carry
    /// no expected revision.
    pub fn move_file(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        from: &str,
        to: &str,
        message: &str,
    ) -> Result<CommitRecord, EditorError> {
        validate_not_empty(message, "commit message")?;
        validate_required_path(from, "path")?;
        validate_move_target(to, "target path")?;

        self.permissions.check_write(repository)?;
        let mut service = self.open(repository, branch)?;
        let mut modification = Modification::new();
        modification
            .set_branch(branch.cloned())
            .set_commit_message(message)
            .move_file(from, to);

        uploader::commit(service.as_mut(), &modification)
    }

    /// Create a single file named `file_name` in directory `path`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_file(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
        file_name: &str,
        content: impl Read,
        message: &str,
        expected_revision: Option<&Revision>,
    ) -> Result<CommitRecord, EditorError> {
        validate_file_name(file_name, "file name")?;
        let mut batch = self.prepare(repository, branch, path, message, expected_revision)?;
        batch.create(file_name, content)?;
        batch.finalize()
    }

    /// Replace the content of the single file at `file_path`.
    pub fn modify_file(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        file_path: &str,
        content: impl Read,
        message: &str,
        expected_revision: Option<&Revision>,
    ) -> Result<CommitRecord, EditorError> {
        validate_file_path(file_path, "path")?;
        let (path, name) = split_path(file_path);
        let mut batch = self.prepare(repository, branch, path, message, expected_revision)?;
        batch.modify(name, content)?;
        batch.finalize()
    }

    /// Obstacles to deleting `path`, without changing anything.
    pub fn is_deletable(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
    ) -> Result<Obstacles, EditorError> {
        Ok(self.guards.is_deletable(repository, branch, path)?)
    }

    /// Obstacles to modifying `path`, without changing anything.
    pub fn is_modifiable(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
    ) -> Result<Obstacles, EditorError> {
        Ok(self.guards.is_modifiable(repository, branch, path)?)
    }

    /// Obstacles to creating files in directory `path`, without changing
    /// anything.
    pub fn can_create_files_in(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
    ) -> Result<Obstacles, EditorError> {
        Ok(self.guards.can_create_files_in(repository, branch, path)?)
    }

    fn open(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
    ) -> Result<Box<dyn RepositoryService>, EditorError> {
        self.factory
            .create(repository)
            .map_err(|e| EditorError::repository(repository, branch, e))
    }
}
