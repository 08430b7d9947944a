//! repo::traits
//!
//! Repository service contract used by the editor.
//!
//! # Design
//!
//! A [`RepositoryServiceFactory`] opens one [`RepositoryService`] connection
//! per repository. A connection is owned by exactly one caller and released
//! when dropped. All writes go through a single [`Modification`] that the
//! service turns into one commit.
//!
//! Implementations must:
//! - Apply every operation of a modification in one commit, or none
//! - Fail with [`RepoError::Conflict`] when the expected revision is not the
//!   branch tip at commit time
//! - Report unsupported capabilities through [`RepositoryService::supports`]
//!
//! # Example
//!
//! ```ignore
//! use scm_editor::repo::{Modification, RepositoryServiceFactory};
//!
//! let mut service = factory.create(&repo)?;
//! let mut modification = Modification::new();
//! modification
//!     .set_commit_message("Update readme")
//!     .modify_file("README.md", b"hello".to_vec());
//! let id = service.execute(&modification)?;
//! let record = service.changeset(&id, None)?;
//! println!("committed {}", record.id);
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::core::types::{BranchName, RepoId, Revision};

/// Errors from repository services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoError {
    /// The repository is unknown to the factory.
    #[error("repository not found: {0}")]
    NotFound(RepoId),

    /// A commit id could not be resolved.
    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    /// The target branch does not exist.
    #[error("branch not found: {0}")]
    BranchNotFound(String),

    /// A file or directory to modify, delete or move does not exist.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// A file to create or a move target already exists.
    #[error("path already exists: {0}")]
    AlreadyExists(String),

    /// The branch moved since the caller last looked at it.
    #[error("concurrent modification of branch '{branch}': expected {expected}, found {actual}")]
    Conflict {
        /// The branch that was updated
        branch: String,
        /// The revision the caller expected
        expected: String,
        /// The revision actually found
        actual: String,
    },

    /// The repository does not support the required command.
    #[error("repository does not support {0}")]
    Unsupported(RepoCommand),

    /// Any other backend failure.
    #[error("repository error: {message}")]
    Internal {
        /// Description of the failure
        message: String,
    },
}

impl RepoError {
    /// True if the error is a lost race on the branch tip.
    pub fn is_conflict(&self) -> bool {
        matches!(self, RepoError::Conflict { .. })
    }
}

/// Optional repository capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoCommand {
    /// Writing commits
    Modify,
    /// Reading the commit log
    Log,
    /// Listing branches
    Branches,
}

impl std::fmt::Display for RepoCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepoCommand::Modify => write!(f, "modify"),
            RepoCommand::Log => write!(f, "log"),
            RepoCommand::Branches => write!(f, "branches"),
        }
    }
}

/// One file-level change within a [`Modification`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    /// Add a file, replacing an existing one only if `overwrite` is set.
    Create {
        path: String,
        overwrite: bool,
        data: Vec<u8>,
    },
    /// Replace the content of an existing file.
    Modify { path: String, data: Vec<u8> },
    /// Remove a file or directory.
    Delete { path: String },
    /// Rename a file or directory.
    Move { from: String, to: String },
}

impl FileOperation {
    /// The path the operation acts on (the source, for moves).
    pub fn path(&self) -> &str {
        match self {
            FileOperation::Create { path, .. }
            | FileOperation::Modify { path, .. }
            | FileOperation::Delete { path } => path,
            FileOperation::Move { from, .. } => from,
        }
    }
}

/// A pending commit: target, precondition, message and ordered operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modification {
    branch: Option<BranchName>,
    expected_revision: Option<Revision>,
    commit_message: String,
    operations: Vec<FileOperation>,
}

impl Modification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target branch; the repository default when unset.
    pub fn set_branch(&mut self, branch: Option<BranchName>) -> &mut Self {
        self.branch = branch;
        self
    }

    /// Revision the branch tip must equal when the commit is written.
    pub fn set_expected_revision(&mut self, revision: Option<Revision>) -> &mut Self {
        self.expected_revision = revision;
        self
    }

    pub fn set_commit_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.commit_message = message.into();
        self
    }

    pub fn create_file(
        &mut self,
        path: impl Into<String>,
        overwrite: bool,
        data: Vec<u8>,
    ) -> &mut Self {
        self.operations.push(FileOperation::Create {
            path: path.into(),
            overwrite,
            data,
        });
        self
    }

    pub fn modify_file(&mut self, path: impl Into<String>, data: Vec<u8>) -> &mut Self {
        self.operations.push(FileOperation::Modify {
            path: path.into(),
            data,
        });
        self
    }

    pub fn delete_file(&mut self, path: impl Into<String>) -> &mut Self {
        self.operations
            .push(FileOperation::Delete { path: path.into() });
        self
    }

    pub fn move_file(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.operations.push(FileOperation::Move {
            from: from.into(),
            to: to.into(),
        });
        self
    }

    pub fn branch(&self) -> Option<&BranchName> {
        self.branch.as_ref()
    }

    pub fn expected_revision(&self) -> Option<&Revision> {
        self.expected_revision.as_ref()
    }

    pub fn commit_message(&self) -> &str {
        &self.commit_message
    }

    pub fn operations(&self) -> &[FileOperation] {
        &self.operations
    }

    /// True if no operation has been added.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Name and email of a commit author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Person {
    pub name: String,
    pub email: String,
}

/// A commit as reported back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitRecord {
    /// Full commit id
    pub id: String,
    /// Commit author
    pub author: Person,
    /// Author time
    pub timestamp: DateTime<Utc>,
    /// Full commit message
    pub message: String,
    /// Branch the commit was resolved on, if one was named
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<BranchName>,
    /// Parent commit ids, empty for a root commit
    pub parents: Vec<String>,
}

/// A branch and its tip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Branch {
    pub name: BranchName,
    pub revision: String,
}

/// An open connection to one repository.
///
/// Dropping the connection closes it.
pub trait RepositoryService {
    /// The repository this connection belongs to.
    fn repository(&self) -> &RepoId;

    /// Whether the repository supports `command`.
    fn supports(&self, command: RepoCommand) -> bool;

    /// Apply `modification` as one commit and return its id.
    fn execute(&mut self, modification: &Modification) -> Result<String, RepoError>;

    /// Resolve a commit id, optionally requiring it to be on `branch`.
    fn changeset(&self, id: &str, branch: Option<&BranchName>) -> Result<CommitRecord, RepoError>;

    /// All branches and their tips.
    fn branches(&self) -> Result<Vec<Branch>, RepoError>;

    /// Tip of the default branch, or `None` for an empty repository.
    fn latest_revision(&self) -> Result<Option<String>, RepoError>;
}

/// Opens repository connections.
pub trait RepositoryServiceFactory: Send + Sync {
    /// Open a connection to `repository`.
    fn create(&self, repository: &RepoId) -> Result<Box<dyn RepositoryService>, RepoError>;
}
