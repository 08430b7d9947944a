//! editor::errors
//!
//! Error taxonomy of the editing service.

use thiserror::Error;

use crate::auth::PermissionError;
use crate::core::types::{BranchName, RepoId};
use crate::core::validation::ValidationError;
use crate::guard::{GuardError, Obstacles};
use crate::repo::RepoError;

/// One or more guards vetoed a change.
///
/// Carries every obstacle reported, not only the first, together with the
/// repository, branch and path the change targeted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotAllowed {
    pub repository: RepoId,
    pub branch: Option<BranchName>,
    pub path: String,
    pub obstacles: Obstacles,
}

impl std::fmt::Display for ChangeNotAllowed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "change was prevented by other plugins:")?;
        for obstacle in &self.obstacles {
            write!(f, "\n  - {}", obstacle.message())?;
        }
        Ok(())
    }
}

impl std::error::Error for ChangeNotAllowed {}

/// Errors from editing operations.
#[derive(Debug, Error)]
pub enum EditorError {
    /// Client input broke a structural rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A guard vetoed the change.
    #[error(transparent)]
    NotAllowed(#[from] ChangeNotAllowed),

    /// The caller may not write to the repository.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// Content of an uploaded file could not be read.
    #[error("upload of '{file}' failed: {source}")]
    UploadFailed {
        file: String,
        #[source]
        source: std::io::Error,
    },

    /// The repository service failed.
    #[error("{}", repository_message(.repository, .branch.as_ref(), .source))]
    RepositoryAccess {
        repository: RepoId,
        branch: Option<BranchName>,
        #[source]
        source: RepoError,
    },

    /// A guard implementation failed while evaluating.
    #[error(transparent)]
    Guard(#[from] GuardError),
}

fn repository_message(repository: &RepoId, branch: Option<&BranchName>, source: &RepoError) -> String {
    match branch {
        Some(branch) => format!("repository '{repository}' (branch '{branch}'): {source}"),
        None => format!("repository '{repository}': {source}"),
    }
}

impl EditorError {
    /// Wrap a repository failure with its context.
    pub fn repository(
        repository: &RepoId,
        branch: Option<&BranchName>,
        source: RepoError,
    ) -> Self {
        EditorError::RepositoryAccess {
            repository: repository.clone(),
            branch: branch.cloned(),
            source,
        }
    }

    /// Obstacles behind a veto, if this is one.
    pub fn obstacles(&self) -> Option<&Obstacles> {
        match self {
            EditorError::NotAllowed(not_allowed) => Some(&not_allowed.obstacles),
            _ => None,
        }
    }

    /// True if the branch moved under the caller.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EditorError::RepositoryAccess { source, .. } if source.is_conflict())
    }

    /// True if the error was caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EditorError::Validation(_) | EditorError::UploadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Obstacle;

    fn repo() -> RepoId {
        RepoId::new("space", "repo").unwrap()
    }

    #[test]
    fn not_allowed_lists_every_message() {
        let mut obstacles = Obstacles::new();
        obstacles.insert(Obstacle::new("a", "first reason"));
        obstacles.insert(Obstacle::new("b", "second reason"));

        let err = EditorError::from(ChangeNotAllowed {
            repository: repo(),
            branch: None,
            path: "docs".into(),
            obstacles,
        });

        let message = err.to_string();
        assert!(message.starts_with("change was prevented by other plugins:"));
        assert!(message.contains("first reason"));
        assert!(message.contains("second reason"));
        assert_eq!(err.obstacles().map(|o| o.len()), Some(2));
    }

    #[test]
    fn conflict_detected_through_repository_access() {
        let err = EditorError::repository(
            &repo(),
            Some(&BranchName::new("main").unwrap()),
            RepoError::Conflict {
                branch: "main".into(),
                expected: "a".into(),
                actual: "b".into(),
            },
        );
        assert!(err.is_conflict());
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("branch 'main'"));
    }

    #[test]
    fn client_errors() {
        let validation = EditorError::from(ValidationError::new("path", "must not be empty"));
        assert!(validation.is_client_error());
        assert_eq!(validation.to_string(), "path must not be empty");

        let upload = EditorError::UploadFailed {
            file: "a.txt".into(),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated"),
        };
        assert!(upload.is_client_error());
        assert!(upload.to_string().contains("a.txt"));
    }
}
