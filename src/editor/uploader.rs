//! editor::uploader
//!
//! A pending batch of file changes that becomes one commit.
//!
//! # Lifecycle
//!
//! ```text
//! prepare ──> create / modify (any number) ──> finalize ──> committed
//!                                                  └──────> rejected
//! ```
//!
//! `finalize` consumes the batch, so it can run at most once and nothing can
//! be added afterwards. The repository connection belongs to the batch and
//! is closed when the batch is dropped, whether or not it was finalized.

use std::io::Read;

use tracing::{debug, info, warn};

use super::errors::{ChangeNotAllowed, EditorError};
use crate::core::types::{BranchName, RepoId};
use crate::core::validation::{join_path, validate_file_path, ValidationError, NOT_EMPTY_RULE};
use crate::guard::GuardCheck;
use crate::repo::{CommitRecord, Modification, RepositoryService};

/// A batch of file creations and modifications under one target path.
pub struct FileUploader {
    service: Box<dyn RepositoryService>,
    guards: GuardCheck,
    modification: Modification,
    branch: Option<BranchName>,
    path: String,
    created_files: Vec<String>,
    modified_files: Vec<String>,
}

impl std::fmt::Debug for FileUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileUploader")
            .field("repository", self.service.repository())
            .field("branch", &self.branch)
            .field("path", &self.path)
            .field("created_files", &self.created_files)
            .field("modified_files", &self.modified_files)
            .finish()
    }
}

impl FileUploader {
    pub(crate) fn new(
        service: Box<dyn RepositoryService>,
        guards: GuardCheck,
        modification: Modification,
        path: String,
    ) -> Self {
        Self {
            branch: modification.branch().cloned(),
            service,
            guards,
            modification,
            path,
            created_files: Vec::new(),
            modified_files: Vec::new(),
        }
    }

    /// Add a file named `name` under the target path, replacing any
    /// existing file.
    ///
    /// # Errors
    ///
    /// - [`EditorError::Validation`] if the combined path is unsafe
    /// - [`EditorError::UploadFailed`] if `content` cannot be read
    pub fn create(&mut self, name: &str, content: impl Read) -> Result<&mut Self, EditorError> {
        let path = join_path(&self.path, name);
        validate_file_path(&path, "path")?;
        let data = read_content(&path, content)?;

        self.modification.create_file(path.as_str(), true, data);
        self.created_files.push(path);
        Ok(self)
    }

    /// Replace the content of file `name` under the target path.
    ///
    /// # Errors
    ///
    /// Same as [`FileUploader::create`].
    pub fn modify(&mut self, name: &str, content: impl Read) -> Result<&mut Self, EditorError> {
        let path = join_path(&self.path, name);
        validate_file_path(&path, "path")?;
        let data = read_content(&path, content)?;

        self.modification.modify_file(path.as_str(), data);
        self.modified_files.push(path);
        Ok(self)
    }

    /// Ask the guards about the whole batch and, if none objects, commit it.
    ///
    /// # Errors
    ///
    /// - [`EditorError::Validation`] if nothing was added
    /// - [`EditorError::NotAllowed`] with every obstacle if any guard objects;
    ///   nothing is committed
    /// - [`EditorError::Guard`] if a guard fails
    /// - [`EditorError::RepositoryAccess`] if the commit or its lookup fails
    pub fn finalize(mut self) -> Result<CommitRecord, EditorError> {
        if self.modification.is_empty() {
            return Err(ValidationError::new("files", NOT_EMPTY_RULE).into());
        }

        let repository = self.service.repository().clone();
        let obstacles = self.guards.is_modifiable_and_creatable(
            &repository,
            self.branch.as_ref(),
            &self.modified_files,
            &self.created_files,
        )?;
        if !obstacles.is_empty() {
            warn!(
                %repository,
                path = %self.path,
                obstacles = obstacles.len(),
                "batch vetoed by guards"
            );
            return Err(ChangeNotAllowed {
                repository,
                branch: self.branch,
                path: self.path,
                obstacles,
            }
            .into());
        }

        debug!(
            %repository,
            created = self.created_files.len(),
            modified = self.modified_files.len(),
            "committing batch"
        );
        commit(self.service.as_mut(), &self.modification)
    }

    /// Full paths of files added with [`FileUploader::create`].
    pub fn created_files(&self) -> &[String] {
        &self.created_files
    }

    /// Full paths of files added with [`FileUploader::modify`].
    pub fn modified_files(&self) -> &[String] {
        &self.modified_files
    }

    /// The target path prefix.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn branch(&self) -> Option<&BranchName> {
        self.branch.as_ref()
    }

    pub fn repository(&self) -> &RepoId {
        self.service.repository()
    }
}

fn read_content(path: &str, mut content: impl Read) -> Result<Vec<u8>, EditorError> {
    let mut data = Vec::new();
    content
        .read_to_end(&mut data)
        .map_err(|source| EditorError::UploadFailed {
            file: path.to_string(),
            source,
        })?;
    Ok(data)
}

/// Execute `modification` and resolve the new commit on its branch.
pub(crate) fn commit(
    service: &mut dyn RepositoryService,
    modification: &Modification,
) -> Result<CommitRecord, EditorError> {
    let repository = service.repository().clone();
    let branch = modification.branch();

    let id = service
        .execute(modification)
        .map_err(|e| EditorError::repository(&repository, branch, e))?;
    let record = service
        .changeset(&id, branch)
        .map_err(|e| EditorError::repository(&repository, branch, e))?;

    info!(
        %repository,
        branch = branch.map(BranchName::as_str),
        commit = %record.id,
        "created commit"
    );
    Ok(record)
}
