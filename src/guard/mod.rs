//! guard
//!
//! Pluggable policy modules that may veto proposed file changes.
//!
//! # Architecture
//!
//! A [`Guard`] inspects a [`ChangeDescription`] for one repository and branch
//! and reports zero or more [`Obstacle`]s. Guards are registered once, at
//! startup, into a [`GuardCheck`], which fans every question out to all of
//! them and unions the answers.
//!
//! One description shape serves every change kind: most calls populate only
//! the field relevant to them (files to delete, files to modify, a directory
//! to create files in), and batch finalization populates both the modify and
//! create sets so a guard sees the whole commit at once.
//!
//! # Invariants
//!
//! - Guards are read-only; evaluating one never changes state
//! - An empty result means "no objection"
//! - A failing guard propagates its error; it is never treated as a veto
//!
//! # Example
//!
//! ```
//! use scm_editor::core::types::{BranchName, RepoId};
//! use scm_editor::guard::{ChangeDescription, Guard, GuardCheck, GuardError, Obstacle};
//!
//! struct NoReadmeChanges;
//!
//! impl Guard for NoReadmeChanges {
//!     fn evaluate(
//!         &self,
//!         _repository: &RepoId,
//!         _branch: Option<&BranchName>,
//!         changes: &ChangeDescription,
//!     ) -> Result<Vec<Obstacle>, GuardError> {
//!         Ok(changes
//!             .all_files()
//!             .filter(|p| p.ends_with("README.md"))
//!             .map(|p| Obstacle::new("readme", format!("{p} is maintained elsewhere")))
//!             .collect())
//!     }
//! }
//!
//! let check = GuardCheck::empty().with_guard(NoReadmeChanges);
//! let repo = RepoId::new("space", "repo").unwrap();
//! let obstacles = check.is_modifiable(&repo, None, "docs/README.md").unwrap();
//! assert_eq!(obstacles.len(), 1);
//! ```

pub mod builtin;
pub mod check;

pub use check::GuardCheck;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{BranchName, RepoId};

/// A reason a change cannot proceed.
///
/// Obstacles are plain values: two obstacles with the same key and message
/// are the same obstacle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Obstacle {
    key: String,
    message: String,
}

impl Obstacle {
    /// Create an obstacle from a stable key and a human-readable message.
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Human-readable explanation.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Obstacle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.message, self.key)
    }
}

/// The union of obstacles reported by all guards.
pub type Obstacles = BTreeSet<Obstacle>;

/// A guard implementation failed while evaluating.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("guard '{guard}' failed: {message}")]
pub struct GuardError {
    /// Name of the failing guard
    pub guard: String,
    /// Description of the failure
    pub message: String,
}

impl GuardError {
    /// Create a guard failure.
    pub fn new(guard: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            guard: guard.into(),
            message: message.into(),
        }
    }
}

/// A proposed set of changes for one guard evaluation.
///
/// Built with [`ChangeDescription::builder`]; read-only afterwards. Fields a
/// call site does not set stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeDescription {
    files_to_modify: BTreeSet<String>,
    files_to_create: BTreeSet<String>,
    files_to_delete: BTreeSet<String>,
    path_for_create: Option<String>,
}

impl ChangeDescription {
    /// Start building a description.
    pub fn builder() -> ChangeDescriptionBuilder {
        ChangeDescriptionBuilder::default()
    }

    /// Existing files that would be changed.
    pub fn files_to_modify(&self) -> &BTreeSet<String> {
        &self.files_to_modify
    }

    /// New files that would be created (or overwritten).
    pub fn files_to_create(&self) -> &BTreeSet<String> {
        &self.files_to_create
    }

    /// Files that would be removed.
    pub fn files_to_delete(&self) -> &BTreeSet<String> {
        &self.files_to_delete
    }

    /// Directory in which files may be created, when asking only whether
    /// creation there is allowed at all.
    pub fn path_for_create(&self) -> Option<&str> {
        self.path_for_create.as_deref()
    }

    /// Every named file across modify, create and delete.
    pub fn all_files(&self) -> impl Iterator<Item = &str> {
        self.files_to_modify
            .iter()
            .chain(&self.files_to_create)
            .chain(&self.files_to_delete)
            .map(String::as_str)
    }

    /// Number of named files across modify, create and delete.
    pub fn file_count(&self) -> usize {
        self.files_to_modify.len() + self.files_to_create.len() + self.files_to_delete.len()
    }

    /// True if no field is populated.
    pub fn is_empty(&self) -> bool {
        self.file_count() == 0 && self.path_for_create.is_none()
    }
}

/// Builder for [`ChangeDescription`].
#[derive(Debug, Default)]
pub struct ChangeDescriptionBuilder {
    inner: ChangeDescription,
}

impl ChangeDescriptionBuilder {
    pub fn files_to_modify<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.files_to_modify = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn files_to_create<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.files_to_create = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn files_to_delete<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.files_to_delete = files.into_iter().map(Into::into).collect();
        self
    }

    pub fn path_for_create(mut self, path: impl Into<String>) -> Self {
        self.inner.path_for_create = Some(path.into());
        self
    }

    pub fn build(self) -> ChangeDescription {
        self.inner
    }
}

/// A policy module that can veto proposed changes.
///
/// Implementations must be read-only and reentrant: the same guard may be
/// evaluated concurrently for unrelated batches.
pub trait Guard: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Report every reason the described changes must not happen.
    fn evaluate(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        changes: &ChangeDescription,
    ) -> Result<Vec<Obstacle>, GuardError>;
}

impl<F> Guard for F
where
    F: Fn(&RepoId, Option<&BranchName>, &ChangeDescription) -> Result<Vec<Obstacle>, GuardError>
        + Send
        + Sync,
{
    fn evaluate(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        changes: &ChangeDescription,
    ) -> Result<Vec<Obstacle>, GuardError> {
        self(repository, branch, changes)
    }
}
