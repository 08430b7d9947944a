//! repo::git
//!
//! Repository service for local git repositories, built on `git2`.
//!
//! # Commit pipeline
//!
//! 1. Resolve the target ref: the named branch, or the branch `HEAD` points to
//! 2. Check the expected revision against the current tip
//! 3. Seed an in-memory index from the tip tree and apply every operation
//! 4. Write the tree and one commit object
//! 5. Move the branch ref with compare-and-swap semantics
//!
//! Only objects and the branch ref are written. The working tree and the
//! on-disk index are never touched, so the service behaves like a push to
//! the repository.
//!
//! # Example
//!
//! ```no_run
//! use scm_editor::core::types::RepoId;
//! use scm_editor::repo::git::GitRepositoryServiceFactory;
//! use scm_editor::repo::{Modification, RepositoryServiceFactory};
//!
//! let repo = RepoId::new("space", "repo").unwrap();
//! let factory = GitRepositoryServiceFactory::new().with_repository(repo.clone(), "/srv/repo");
//!
//! let mut service = factory.create(&repo).unwrap();
//! let mut modification = Modification::new();
//! modification
//!     .set_commit_message("Add notes")
//!     .create_file("notes.txt", true, b"hello\n".to_vec());
//! let id = service.execute(&modification).unwrap();
//! println!("{}", service.changeset(&id, None).unwrap().message);
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use git2::{BranchType, ErrorCode, Index, IndexEntry, IndexTime, Oid, Signature};
use tracing::{debug, trace};

use super::{
    Branch, CommitRecord, FileOperation, Modification, Person, RepoCommand, RepoError,
    RepositoryService, RepositoryServiceFactory,
};
use crate::core::config::AuthorConfig;
use crate::core::types::{BranchName, RepoId};

/// Identity used when neither configuration nor git provides one.
pub const FALLBACK_AUTHOR_NAME: &str = "scm-editor";

/// Email used with [`FALLBACK_AUTHOR_NAME`].
pub const FALLBACK_AUTHOR_EMAIL: &str = "scm-editor@localhost";

const FILE_MODE: u32 = 0o100644;

impl From<git2::Error> for RepoError {
    fn from(err: git2::Error) -> Self {
        RepoError::Internal {
            message: err.message().to_string(),
        }
    }
}

/// Opens [`GitRepositoryService`] connections.
///
/// Repositories are located by explicit registration first, then under
/// `<root>/<namespace>/<name>` when a root is set.
#[derive(Debug, Clone, Default)]
pub struct GitRepositoryServiceFactory {
    repositories: HashMap<RepoId, PathBuf>,
    root: Option<PathBuf>,
    author: Option<AuthorConfig>,
}

impl GitRepositoryServiceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the location of one repository.
    pub fn with_repository(mut self, id: RepoId, path: impl Into<PathBuf>) -> Self {
        self.repositories.insert(id, path.into());
        self
    }

    /// Directory holding repositories as `<namespace>/<name>`.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Identity recorded on created commits.
    pub fn with_author(mut self, author: Option<AuthorConfig>) -> Self {
        self.author = author;
        self
    }

    fn locate(&self, id: &RepoId) -> Option<PathBuf> {
        if let Some(path) = self.repositories.get(id) {
            return Some(path.clone());
        }
        self.root
            .as_ref()
            .map(|root| root.join(id.namespace()).join(id.name()))
            .filter(|path| path.exists())
    }
}

impl RepositoryServiceFactory for GitRepositoryServiceFactory {
    fn create(&self, repository: &RepoId) -> Result<Box<dyn RepositoryService>, RepoError> {
        let path = self
            .locate(repository)
            .ok_or_else(|| RepoError::NotFound(repository.clone()))?;
        let service = GitRepositoryService::open(repository.clone(), &path, self.author.clone())?;
        Ok(Box::new(service))
    }
}

/// A connection to one local git repository.
pub struct GitRepositoryService {
    id: RepoId,
    repo: git2::Repository,
    author: Option<AuthorConfig>,
}

impl std::fmt::Debug for GitRepositoryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepositoryService")
            .field("id", &self.id)
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Drop for GitRepositoryService {
    fn drop(&mut self) {
        trace!(repository = %self.id, "closing repository connection");
    }
}

/// Where a commit will land.
struct Target {
    refname: String,
    tip: Option<Oid>,
}

impl Target {
    fn branch_name(&self) -> &str {
        self.refname
            .strip_prefix("refs/heads/")
            .unwrap_or(&self.refname)
    }
}

impl GitRepositoryService {
    /// Open the repository at `path` (working tree or bare).
    pub fn open(id: RepoId, path: &Path, author: Option<AuthorConfig>) -> Result<Self, RepoError> {
        let repo = git2::Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => RepoError::NotFound(id.clone()),
            _ => RepoError::Internal {
                message: format!("failed to open {}: {}", path.display(), e.message()),
            },
        })?;
        trace!(repository = %id, path = %path.display(), "opened repository connection");
        Ok(Self { id, repo, author })
    }

    /// The ref `HEAD` points to, e.g. `refs/heads/main`.
    fn head_refname(&self) -> Result<String, RepoError> {
        let head = self.repo.find_reference("HEAD")?;
        head.symbolic_target()
            .map(str::to_string)
            .ok_or_else(|| RepoError::Internal {
                message: "HEAD is detached".into(),
            })
    }

    fn try_resolve(&self, refname: &str) -> Result<Option<Oid>, RepoError> {
        match self.repo.refname_to_id(refname) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn has_branches(&self) -> Result<bool, RepoError> {
        Ok(self.repo.branches(Some(BranchType::Local))?.next().is_some())
    }

    fn target(&self, branch: Option<&BranchName>) -> Result<Target, RepoError> {
        match branch {
            Some(branch) => {
                let refname = branch.to_ref();
                let tip = self.try_resolve(&refname)?;
                if tip.is_none() && self.has_branches()? {
                    return Err(RepoError::BranchNotFound(branch.to_string()));
                }
                Ok(Target { refname, tip })
            }
            None => {
                let refname = self.head_refname()?;
                let tip = self.try_resolve(&refname)?;
                Ok(Target { refname, tip })
            }
        }
    }

    fn signature(&self) -> Result<Signature<'static>, RepoError> {
        if let Some(author) = &self.author {
            return Ok(Signature::now(&author.name, &author.email)?);
        }
        match self.repo.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Ok(Signature::now(FALLBACK_AUTHOR_NAME, FALLBACK_AUTHOR_EMAIL)?),
        }
    }

    fn apply(&self, index: &mut Index, operation: &FileOperation) -> Result<(), RepoError> {
        match operation {
            FileOperation::Create {
                path,
                overwrite,
                data,
            } => {
                let path = normalize(path);
                let exists = index.get_path(Path::new(path), 0).is_some();
                if (exists && !overwrite) || is_directory(index, path) {
                    return Err(RepoError::AlreadyExists(path.to_string()));
                }
                ensure_no_file_ancestor(index, path)?;
                self.add_blob(index, path, data, FILE_MODE)
            }
            FileOperation::Modify { path, data } => {
                let path = normalize(path);
                let existing = index
                    .get_path(Path::new(path), 0)
                    .ok_or_else(|| RepoError::PathNotFound(path.to_string()))?;
                self.add_blob(index, path, data, existing.mode)
            }
            FileOperation::Delete { path } => {
                let path = normalize(path);
                if index.get_path(Path::new(path), 0).is_some() {
                    index.remove_path(Path::new(path))?;
                } else if is_directory(index, path) {
                    index.remove_dir(Path::new(path), 0)?;
                } else {
                    return Err(RepoError::PathNotFound(path.to_string()));
                }
                Ok(())
            }
            FileOperation::Move { from, to } => {
                let (from, to) = (normalize(from), normalize(to));
                if index.get_path(Path::new(to), 0).is_some() || is_directory(index, to) {
                    return Err(RepoError::AlreadyExists(to.to_string()));
                }
                ensure_no_file_ancestor(index, to)?;
                if let Some(mut entry) = index.get_path(Path::new(from), 0) {
                    index.remove_path(Path::new(from))?;
                    entry.path = to.as_bytes().to_vec();
                    index.add(&entry)?;
                    return Ok(());
                }

                let prefix = format!("{from}/");
                let entries: Vec<IndexEntry> = index
                    .iter()
                    .filter(|e| e.path.starts_with(prefix.as_bytes()))
                    .collect();
                if entries.is_empty() {
                    return Err(RepoError::PathNotFound(from.to_string()));
                }
                for mut entry in entries {
                    let old = String::from_utf8_lossy(&entry.path).into_owned();
                    index.remove_path(Path::new(&old))?;
                    entry.path = format!("{to}/{}", &old[prefix.len()..]).into_bytes();
                    index.add(&entry)?;
                }
                Ok(())
            }
        }
    }

    fn add_blob(
        &self,
        index: &mut Index,
        path: &str,
        data: &[u8],
        mode: u32,
    ) -> Result<(), RepoError> {
        let id = self.repo.blob(data)?;
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode,
            uid: 0,
            gid: 0,
            file_size: data.len() as u32,
            id,
            flags: 0,
            flags_extended: 0,
            path: path.as_bytes().to_vec(),
        };
        index.add(&entry)?;
        Ok(())
    }

    fn record(&self, commit: &git2::Commit<'_>, branch: Option<&BranchName>) -> CommitRecord {
        let author = commit.author();
        let timestamp = chrono::DateTime::from_timestamp(author.when().seconds(), 0)
            .unwrap_or(chrono::DateTime::UNIX_EPOCH)
            .with_timezone(&chrono::Utc);

        CommitRecord {
            id: commit.id().to_string(),
            author: Person {
                name: author.name().unwrap_or("").to_string(),
                email: author.email().unwrap_or("").to_string(),
            },
            timestamp,
            message: commit.message().unwrap_or("").to_string(),
            branch: branch.cloned(),
            parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        }
    }
}

impl RepositoryService for GitRepositoryService {
    fn repository(&self) -> &RepoId {
        &self.id
    }

    fn supports(&self, command: RepoCommand) -> bool {
        match command {
            RepoCommand::Modify | RepoCommand::Log | RepoCommand::Branches => true,
        }
    }

    fn execute(&mut self, modification: &Modification) -> Result<String, RepoError> {
        let target = self.target(modification.branch())?;

        if let Some(expected) = modification.expected_revision() {
            let actual = target.tip.map(|oid| oid.to_string());
            if !actual.as_deref().is_some_and(|a| expected.matches(a)) {
                return Err(RepoError::Conflict {
                    branch: target.branch_name().to_string(),
                    expected: expected.to_string(),
                    actual: actual.unwrap_or_else(|| "<none>".into()),
                });
            }
        }

        let parent = target
            .tip
            .map(|oid| self.repo.find_commit(oid))
            .transpose()?;

        let mut index = Index::new()?;
        if let Some(parent) = &parent {
            index.read_tree(&parent.tree()?)?;
        }
        for operation in modification.operations() {
            self.apply(&mut index, operation)?;
        }

        let tree_id = index.write_tree_to(&self.repo)?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.signature()?;
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        let commit_id = self.repo.commit(
            None,
            &signature,
            &signature,
            modification.commit_message(),
            &tree,
            &parents,
        )?;

        let log_message = format!("scm-editor: {}", modification.commit_message());
        let updated = match target.tip {
            Some(old) => self.repo.reference_matching(
                &target.refname,
                commit_id,
                true,
                old,
                &log_message,
            ),
            None => self
                .repo
                .reference(&target.refname, commit_id, false, &log_message),
        };

        if let Err(e) = updated {
            return match e.code() {
                ErrorCode::Modified | ErrorCode::Exists | ErrorCode::Locked => {
                    let actual = self.try_resolve(&target.refname)?;
                    Err(RepoError::Conflict {
                        branch: target.branch_name().to_string(),
                        expected: target
                            .tip
                            .map(|oid| oid.to_string())
                            .unwrap_or_else(|| "<none>".into()),
                        actual: actual
                            .map(|oid| oid.to_string())
                            .unwrap_or_else(|| "<none>".into()),
                    })
                }
                _ => Err(e.into()),
            };
        }

        debug!(
            repository = %self.id,
            branch = target.branch_name(),
            commit = %commit_id,
            operations = modification.operations().len(),
            "wrote commit"
        );
        Ok(commit_id.to_string())
    }

    fn changeset(&self, id: &str, branch: Option<&BranchName>) -> Result<CommitRecord, RepoError> {
        let commit = self
            .repo
            .revparse_single(id)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| RepoError::RevisionNotFound(id.to_string()))?;

        if let Some(branch) = branch {
            let tip = self
                .try_resolve(&branch.to_ref())?
                .ok_or_else(|| RepoError::BranchNotFound(branch.to_string()))?;
            if tip != commit.id() && !self.repo.graph_descendant_of(tip, commit.id())? {
                return Err(RepoError::RevisionNotFound(format!(
                    "{id} on branch {branch}"
                )));
            }
        }

        Ok(self.record(&commit, branch))
    }

    fn branches(&self) -> Result<Vec<Branch>, RepoError> {
        let mut branches = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let Some(name) = branch.name()? else {
                continue;
            };
            let Ok(name) = BranchName::new(name) else {
                continue;
            };
            if let Some(tip) = branch.get().target() {
                branches.push(Branch {
                    name,
                    revision: tip.to_string(),
                });
            }
        }
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    fn latest_revision(&self) -> Result<Option<String>, RepoError> {
        let refname = self.head_refname()?;
        Ok(self.try_resolve(&refname)?.map(|oid| oid.to_string()))
    }
}

/// Repository paths are stored without leading or trailing `/`.
fn normalize(path: &str) -> &str {
    path.trim_matches('/')
}

fn is_directory(index: &Index, path: &str) -> bool {
    let prefix = format!("{path}/");
    index.iter().any(|e| e.path.starts_with(prefix.as_bytes()))
}

/// Fails if a parent directory of `path` is a file.
///
/// Adding `a/b` while `a` is a file would make the index replace `a`, a
/// file the modification never named.
fn ensure_no_file_ancestor(index: &Index, path: &str) -> Result<(), RepoError> {
    for (end, _) in path.match_indices('/') {
        let ancestor = &path[..end];
        if index.get_path(Path::new(ancestor), 0).is_some() {
            return Err(RepoError::AlreadyExists(ancestor.to_string()));
        }
    }
    Ok(())
}

/// Find the repository containing `path` and return its root: the working
/// tree for a normal repository, the git dir for a bare one.
pub fn discover(path: &Path) -> Result<PathBuf, RepoError> {
    let repo = git2::Repository::discover(path).map_err(|e| RepoError::Internal {
        message: format!("no git repository at {}: {}", path.display(), e.message()),
    })?;
    Ok(repo
        .workdir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| repo.path().to_path_buf()))
}

/// The branch `HEAD` of the repository at `path` points to, which is where
/// a change without an explicit branch is committed. `None` when `HEAD` is
/// detached or names something other than a local branch.
pub fn head_branch(path: &Path) -> Result<Option<BranchName>, RepoError> {
    let repo = git2::Repository::open(path).map_err(|e| RepoError::Internal {
        message: format!("failed to open {}: {}", path.display(), e.message()),
    })?;
    let head = repo.find_reference("HEAD")?;
    Ok(head
        .symbolic_target()
        .and_then(|target| target.strip_prefix("refs/heads/"))
        .and_then(|name| BranchName::new(name).ok()))
}
