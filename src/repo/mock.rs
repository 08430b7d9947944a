//! repo::mock
//!
//! Mock repository service for deterministic testing.
//!
//! # Design
//!
//! The mock keeps branches, commits and call history in memory, shared by
//! the factory and every connection it opens. Tests inspect the history to
//! verify what the editor did: which connections were opened and closed,
//! which modifications were executed, and in what order calls happened.
//!
//! Commit ids are deterministic: the n-th commit is `n` rendered as 40 hex
//! digits.
//!
//! # Example
//!
//! ```
//! use scm_editor::core::types::RepoId;
//! use scm_editor::repo::mock::MockRepositoryFactory;
//! use scm_editor::repo::{Modification, RepositoryServiceFactory};
//!
//! let factory = MockRepositoryFactory::new().with_branch("main", "a".repeat(40));
//! let repo = RepoId::new("space", "repo").unwrap();
//!
//! {
//!     let mut service = factory.create(&repo).unwrap();
//!     let mut modification = Modification::new();
//!     modification.delete_file("old.txt");
//!     service.execute(&modification).unwrap();
//! }
//!
//! assert_eq!(factory.executed().len(), 1);
//! assert_eq!(factory.open_connections(), 0);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use super::{
    Branch, CommitRecord, Modification, Person, RepoCommand, RepoError, RepositoryService,
    RepositoryServiceFactory,
};
use crate::core::types::{BranchName, RepoId};

/// Mock repository factory for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRepositoryFactory {
    inner: Arc<Mutex<MockInner>>,
}

#[derive(Debug, Default)]
struct MockInner {
    /// Branch tips.
    branches: BTreeMap<BranchName, String>,
    /// Tip of the default branch.
    latest_revision: Option<String>,
    /// Commands connections report as unsupported.
    unsupported: HashSet<RepoCommand>,
    /// Call to fail (for testing error paths).
    fail_on: Option<FailOn>,
    /// Recorded calls for verification.
    operations: Vec<MockOperation>,
    /// Every modification passed to `execute`.
    executed: Vec<Modification>,
    /// Commits written by `execute`.
    commits: HashMap<String, CommitRecord>,
    next_commit: u64,
    opened: usize,
    closed: usize,
}

/// Configuration for which call should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    /// Fail `RepositoryServiceFactory::create` with the given error.
    Open(RepoError),
    /// Fail `execute` with the given error.
    Execute(RepoError),
    /// Fail `changeset` with the given error.
    Changeset(RepoError),
}

/// Recorded call for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    Open { repository: RepoId },
    Execute { repository: RepoId },
    Changeset { id: String, branch: Option<BranchName> },
    Branches,
    LatestRevision,
    Close { repository: RepoId },
}

impl MockRepositoryFactory {
    /// Create a mock with no branches and an empty default branch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a branch with the given tip.
    pub fn with_branch(self, name: &str, revision: impl Into<String>) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let name = BranchName::new(name).expect("valid branch name");
            inner.branches.insert(name, revision.into());
        }
        self
    }

    /// Set the tip of the default branch.
    pub fn with_latest_revision(self, revision: impl Into<String>) -> Self {
        self.inner.lock().unwrap().latest_revision = Some(revision.into());
        self
    }

    /// Make connections report `command` as unsupported.
    pub fn without_command(self, command: RepoCommand) -> Self {
        self.inner.lock().unwrap().unsupported.insert(command);
        self
    }

    /// Configure a call to fail.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.inner.lock().unwrap().fail_on = Some(fail_on);
        self
    }

    /// All recorded calls, oldest first.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.inner.lock().unwrap().operations.clone()
    }

    /// Every modification passed to `execute`.
    pub fn executed(&self) -> Vec<Modification> {
        self.inner.lock().unwrap().executed.clone()
    }

    /// Number of connections opened so far.
    pub fn opened_count(&self) -> usize {
        self.inner.lock().unwrap().opened
    }

    /// Number of connections closed so far.
    pub fn closed_count(&self) -> usize {
        self.inner.lock().unwrap().closed
    }

    /// Connections opened but not yet closed.
    pub fn open_connections(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.opened - inner.closed
    }

    /// Current tip of `branch`.
    pub fn branch_tip(&self, branch: &str) -> Option<String> {
        let branch = BranchName::new(branch).ok()?;
        self.inner.lock().unwrap().branches.get(&branch).cloned()
    }

    fn record(&self, op: MockOperation) {
        self.inner.lock().unwrap().operations.push(op);
    }
}

impl RepositoryServiceFactory for MockRepositoryFactory {
    fn create(&self, repository: &RepoId) -> Result<Box<dyn RepositoryService>, RepoError> {
        self.record(MockOperation::Open {
            repository: repository.clone(),
        });

        let mut inner = self.inner.lock().unwrap();
        if let Some(FailOn::Open(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        inner.opened += 1;

        Ok(Box::new(MockRepositoryService {
            id: repository.clone(),
            factory: self.clone(),
        }))
    }
}

/// A connection opened by [`MockRepositoryFactory`].
#[derive(Debug)]
pub struct MockRepositoryService {
    id: RepoId,
    factory: MockRepositoryFactory,
}

impl Drop for MockRepositoryService {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.factory.inner.lock() {
            inner.closed += 1;
            inner.operations.push(MockOperation::Close {
                repository: self.id.clone(),
            });
        }
    }
}

impl RepositoryService for MockRepositoryService {
    fn repository(&self) -> &RepoId {
        &self.id
    }

    fn supports(&self, command: RepoCommand) -> bool {
        !self.factory.inner.lock().unwrap().unsupported.contains(&command)
    }

    fn execute(&mut self, modification: &Modification) -> Result<String, RepoError> {
        self.factory.record(MockOperation::Execute {
            repository: self.id.clone(),
        });

        let mut inner = self.factory.inner.lock().unwrap();
        inner.executed.push(modification.clone());
        if let Some(FailOn::Execute(e)) = &inner.fail_on {
            return Err(e.clone());
        }

        let branch = modification.branch();
        let tip = match branch {
            Some(b) => {
                let tip = inner.branches.get(b).cloned();
                if tip.is_none() && !inner.branches.is_empty() {
                    return Err(RepoError::BranchNotFound(b.to_string()));
                }
                tip
            }
            None => inner.latest_revision.clone(),
        };

        if let Some(expected) = modification.expected_revision() {
            if !tip.as_deref().is_some_and(|t| expected.matches(t)) {
                return Err(RepoError::Conflict {
                    branch: branch.map(|b| b.to_string()).unwrap_or_default(),
                    expected: expected.to_string(),
                    actual: tip.unwrap_or_else(|| "<none>".into()),
                });
            }
        }

        inner.next_commit += 1;
        let id = format!("{:040x}", inner.next_commit);
        let record = CommitRecord {
            id: id.clone(),
            author: Person {
                name: "Mock Author".into(),
                email: "mock@example.com".into(),
            },
            timestamp: chrono::DateTime::UNIX_EPOCH,
            message: modification.commit_message().to_string(),
            branch: None,
            parents: tip.into_iter().collect(),
        };
        inner.commits.insert(id.clone(), record);
        match branch {
            Some(b) => {
                inner.branches.insert(b.clone(), id.clone());
            }
            None => inner.latest_revision = Some(id.clone()),
        }
        Ok(id)
    }

    fn changeset(&self, id: &str, branch: Option<&BranchName>) -> Result<CommitRecord, RepoError> {
        self.factory.record(MockOperation::Changeset {
            id: id.to_string(),
            branch: branch.cloned(),
        });

        let inner = self.factory.inner.lock().unwrap();
        if let Some(FailOn::Changeset(e)) = &inner.fail_on {
            return Err(e.clone());
        }
        let mut record = inner
            .commits
            .get(id)
            .cloned()
            .ok_or_else(|| RepoError::RevisionNotFound(id.to_string()))?;
        record.branch = branch.cloned();
        Ok(record)
    }

    fn branches(&self) -> Result<Vec<Branch>, RepoError> {
        self.factory.record(MockOperation::Branches);
        let inner = self.factory.inner.lock().unwrap();
        if inner.unsupported.contains(&RepoCommand::Branches) {
            return Err(RepoError::Unsupported(RepoCommand::Branches));
        }
        Ok(inner
            .branches
            .iter()
            .map(|(name, revision)| Branch {
                name: name.clone(),
                revision: revision.clone(),
            })
            .collect())
    }

    fn latest_revision(&self) -> Result<Option<String>, RepoError> {
        self.factory.record(MockOperation::LatestRevision);
        let inner = self.factory.inner.lock().unwrap();
        if inner.unsupported.contains(&RepoCommand::Log) {
            return Err(RepoError::Unsupported(RepoCommand::Log));
        }
        Ok(inner.latest_revision.clone())
    }
}
