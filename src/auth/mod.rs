//! auth - Write permission checks
//!
//! The editor never decides who may write; it asks a [`Permissions`]
//! implementation before any repository connection is used for writing.
//!
//! # Contract
//!
//! - `check_write` is synchronous and side-effect free
//! - A denial is fatal and never retried
//!
//! # Example
//!
//! ```
//! use scm_editor::auth::{AllowAll, Permissions, ReadOnlyRepositories};
//! use scm_editor::core::types::RepoId;
//!
//! let repo = RepoId::new("space", "repo").unwrap();
//! assert!(AllowAll.check_write(&repo).is_ok());
//!
//! let locked = ReadOnlyRepositories::new([repo.clone()]);
//! assert!(!locked.is_write_permitted(&repo));
//! ```

use std::collections::HashSet;

use thiserror::Error;

use crate::core::types::RepoId;

/// Errors from permission checks.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    /// The acting principal may not push to the repository.
    #[error("write access to repository '{repository}' denied")]
    WriteDenied {
        /// The repository that was checked
        repository: RepoId,
    },
}

/// The permission-check capability.
pub trait Permissions: Send + Sync {
    /// Fail if the acting principal lacks write rights on `repository`.
    fn check_write(&self, repository: &RepoId) -> Result<(), PermissionError>;

    /// Non-failing form of [`Permissions::check_write`].
    fn is_write_permitted(&self, repository: &RepoId) -> bool {
        self.check_write(repository).is_ok()
    }
}

/// Grants write access to every repository.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Permissions for AllowAll {
    fn check_write(&self, _repository: &RepoId) -> Result<(), PermissionError> {
        Ok(())
    }
}

/// Denies write access to a fixed set of repositories.
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyRepositories {
    repositories: HashSet<RepoId>,
}

impl ReadOnlyRepositories {
    /// Create a checker that denies writes to the given repositories.
    pub fn new(repositories: impl IntoIterator<Item = RepoId>) -> Self {
        Self {
            repositories: repositories.into_iter().collect(),
        }
    }
}

impl Permissions for ReadOnlyRepositories {
    fn check_write(&self, repository: &RepoId) -> Result<(), PermissionError> {
        if self.repositories.contains(repository) {
            tracing::debug!(%repository, "write denied for read-only repository");
            return Err(PermissionError::WriteDenied {
                repository: repository.clone(),
            });
        }
        Ok(())
    }
}
