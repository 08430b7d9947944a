//! editor::preconditions
//!
//! Whether a repository can be edited at a given revision.
//!
//! Callers use this before offering editing at all: a repository is editable
//! when the caller may write to it, the repository can record commits and
//! report its history, and the revision being viewed is the tip of a branch.
//! Editing an older revision would silently discard later commits from the
//! caller's view, so it is refused up front.

use std::sync::Arc;

use tracing::debug;

use super::errors::EditorError;
use crate::auth::Permissions;
use crate::core::types::{RepoId, Revision};
use crate::repo::{RepoCommand, RepoError, RepositoryService, RepositoryServiceFactory};

/// Editability checks over a repository factory and a permission check.
#[derive(Clone)]
pub struct EditorPreconditions {
    factory: Arc<dyn RepositoryServiceFactory>,
    permissions: Arc<dyn Permissions>,
}

impl EditorPreconditions {
    pub fn new(
        factory: Arc<dyn RepositoryServiceFactory>,
        permissions: Arc<dyn Permissions>,
    ) -> Self {
        Self {
            factory,
            permissions,
        }
    }

    /// True if `repository` may be edited, optionally at `revision`.
    ///
    /// A repository that cannot be written to, cannot record commits, or can
    /// report neither its log nor its branches is not editable. With a
    /// revision, that revision must also be a head revision.
    pub fn is_editable(
        &self,
        repository: &RepoId,
        revision: Option<&Revision>,
    ) -> Result<bool, EditorError> {
        if !self.permissions.is_write_permitted(repository) {
            debug!(%repository, "not editable: write not permitted");
            return Ok(false);
        }

        let service = self
            .factory
            .create(repository)
            .map_err(|e| EditorError::repository(repository, None, e))?;

        if !service.supports(RepoCommand::Modify)
            || !(service.supports(RepoCommand::Log) || service.supports(RepoCommand::Branches))
        {
            debug!(%repository, "not editable: repository lacks required commands");
            return Ok(false);
        }

        match revision {
            Some(revision) => is_head_revision(service.as_ref(), revision)
                .map_err(|e| EditorError::repository(repository, None, e)),
            None => Ok(true),
        }
    }
}

/// True if `revision` is the tip of a branch.
///
/// Without branch support the revision must be the latest one; an empty
/// repository counts every revision as head, since there is nothing to lose.
pub fn is_head_revision(
    service: &dyn RepositoryService,
    revision: &Revision,
) -> Result<bool, RepoError> {
    if service.supports(RepoCommand::Branches) {
        return Ok(service
            .branches()?
            .iter()
            .any(|branch| revision.matches(&branch.revision)));
    }
    Ok(match service.latest_revision()? {
        Some(latest) => revision.matches(&latest),
        None => true,
    })
}
