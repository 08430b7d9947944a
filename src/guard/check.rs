//! guard::check
//!
//! Fan-out of change descriptions to every registered guard.
//!
//! # Semantics
//!
//! - With no guards registered, every question is answered with an empty
//!   obstacle set (changes are permitted by default)
//! - Every guard is asked; there is no short-circuit on the first objection,
//!   so callers see every reason a change is blocked
//! - Results are unioned into one [`Obstacles`] set
//! - A guard failure aborts the check and is returned to the caller
//!
//! The registry is fixed at construction. Guards cannot be added or removed
//! while requests are being served.

use std::sync::Arc;

use tracing::{debug, trace};

use super::{ChangeDescription, Guard, GuardError, Obstacles};
use crate::core::types::{BranchName, RepoId};

/// The set of registered guards.
#[derive(Clone, Default)]
pub struct GuardCheck {
    guards: Vec<Arc<dyn Guard>>,
}

impl std::fmt::Debug for GuardCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardCheck")
            .field(
                "guards",
                &self.guards.iter().map(|g| g.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl GuardCheck {
    /// Create a check over the given guards.
    pub fn new(guards: Vec<Arc<dyn Guard>>) -> Self {
        Self { guards }
    }

    /// Create a check with no guards; every change is permitted.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Register one more guard.
    pub fn with_guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    /// Number of registered guards.
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    /// True if no guard is registered.
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Obstacles to deleting `path`.
    pub fn is_deletable(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
    ) -> Result<Obstacles, GuardError> {
        let changes = ChangeDescription::builder()
            .files_to_delete([path])
            .build();
        self.evaluate(repository, branch, &changes)
    }

    /// Obstacles to modifying `path`.
    pub fn is_modifiable(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
    ) -> Result<Obstacles, GuardError> {
        let changes = ChangeDescription::builder()
            .files_to_modify([path])
            .build();
        self.evaluate(repository, branch, &changes)
    }

    /// Obstacles to creating any file inside directory `path`.
    pub fn can_create_files_in(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        path: &str,
    ) -> Result<Obstacles, GuardError> {
        let changes = ChangeDescription::builder().path_for_create(path).build();
        self.evaluate(repository, branch, &changes)
    }

    /// Obstacles to a whole batch, evaluated in a single pass so that each
    /// guard sees every modified and created file together.
    pub fn is_modifiable_and_creatable(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        to_modify: &[String],
        to_create: &[String],
    ) -> Result<Obstacles, GuardError> {
        let changes = ChangeDescription::builder()
            .files_to_modify(to_modify.iter().cloned())
            .files_to_create(to_create.iter().cloned())
            .build();
        self.evaluate(repository, branch, &changes)
    }

    fn evaluate(
        &self,
        repository: &RepoId,
        branch: Option<&BranchName>,
        changes: &ChangeDescription,
    ) -> Result<Obstacles, GuardError> {
        let mut obstacles = Obstacles::new();
        for guard in &self.guards {
            let found = guard.evaluate(repository, branch, changes)?;
            trace!(guard = guard.name(), count = found.len(), "guard evaluated");
            obstacles.extend(found);
        }
        debug!(
            %repository,
            branch = branch.map(BranchName::as_str),
            guards = self.guards.len(),
            obstacles = obstacles.len(),
            "guard check complete"
        );
        Ok(obstacles)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::guard::Obstacle;

    fn repo() -> RepoId {
        RepoId::new("space", "repo").unwrap()
    }

    /// Returns fixed obstacles and records what it was asked.
    #[derive(Default)]
    struct RecordingGuard {
        obstacles: Vec<Obstacle>,
        seen: Arc<Mutex<Vec<ChangeDescription>>>,
    }

    impl RecordingGuard {
        fn objecting(obstacles: Vec<Obstacle>) -> Self {
            Self {
                obstacles,
                seen: Arc::default(),
            }
        }
    }

    impl Guard for RecordingGuard {
        fn evaluate(
            &self,
            _repository: &RepoId,
            _branch: Option<&BranchName>,
            changes: &ChangeDescription,
        ) -> Result<Vec<Obstacle>, GuardError> {
            self.seen.lock().unwrap().push(changes.clone());
            Ok(self.obstacles.clone())
        }
    }

    #[test]
    fn no_guards_permit_everything() {
        let check = GuardCheck::empty();
        let branch = BranchName::new("main").unwrap();

        assert!(check.is_deletable(&repo(), Some(&branch), "a").unwrap().is_empty());
        assert!(check.is_modifiable(&repo(), None, "a").unwrap().is_empty());
        assert!(check.can_create_files_in(&repo(), None, "dir").unwrap().is_empty());
        assert!(check
            .is_modifiable_and_creatable(&repo(), None, &["a".into()], &["b".into()])
            .unwrap()
            .is_empty());
    }

    #[test]
    fn obstacles_from_all_guards_are_unioned() {
        let check = GuardCheck::empty()
            .with_guard(RecordingGuard::objecting(vec![Obstacle::new("a", "first")]))
            .with_guard(RecordingGuard::default())
            .with_guard(RecordingGuard::objecting(vec![
                Obstacle::new("b", "second"),
                Obstacle::new("c", "third"),
            ]));

        let obstacles = check.is_modifiable(&repo(), None, "file").unwrap();
        let keys: Vec<_> = obstacles.iter().map(Obstacle::key).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);
    }

    #[test]
    fn identical_obstacles_are_reported_once() {
        let same = Obstacle::new("k", "same");
        let check = GuardCheck::empty()
            .with_guard(RecordingGuard::objecting(vec![same.clone()]))
            .with_guard(RecordingGuard::objecting(vec![same]));

        assert_eq!(check.is_deletable(&repo(), None, "x").unwrap().len(), 1);
    }

    #[test]
    fn every_guard_runs_even_after_an_objection() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = |calls: Arc<AtomicUsize>| {
            move |_: &RepoId, _: Option<&BranchName>, _: &ChangeDescription| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, GuardError>(vec![Obstacle::new("veto", "no")])
            }
        };

        let check = GuardCheck::empty()
            .with_guard(counter(calls.clone()))
            .with_guard(counter(calls.clone()))
            .with_guard(counter(calls.clone()));

        check.is_deletable(&repo(), None, "x").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn each_check_builds_the_matching_description() {
        let guard = RecordingGuard::default();
        let seen = guard.seen.clone();
        let check = GuardCheck::empty().with_guard(guard);

        check.is_deletable(&repo(), None, "gone.txt").unwrap();
        check.is_modifiable(&repo(), None, "changed.txt").unwrap();
        check.can_create_files_in(&repo(), None, "docs").unwrap();
        check
            .is_modifiable_and_creatable(
                &repo(),
                None,
                &["m1".into(), "m2".into()],
                &["c1".into()],
            )
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);

        assert!(seen[0].files_to_delete().contains("gone.txt"));
        assert!(seen[0].files_to_modify().is_empty());

        assert!(seen[1].files_to_modify().contains("changed.txt"));
        assert!(seen[1].files_to_delete().is_empty());

        assert_eq!(seen[2].path_for_create(), Some("docs"));
        assert_eq!(seen[2].file_count(), 0);

        assert_eq!(seen[3].files_to_modify().len(), 2);
        assert_eq!(seen[3].files_to_create().len(), 1);
        assert!(seen[3].path_for_create().is_none());
    }

    #[test]
    fn guard_failure_propagates() {
        let failing = |_: &RepoId, _: Option<&BranchName>, _: &ChangeDescription| {
            Err::<Vec<Obstacle>, _>(GuardError::new("lookup", "policy store unavailable"))
        };
        let check = GuardCheck::empty().with_guard(failing);

        let err = check.is_modifiable(&repo(), None, "a").unwrap_err();
        assert_eq!(err.guard, "lookup");
    }

    #[test]
    fn debug_lists_guard_count() {
        let check = GuardCheck::empty().with_guard(RecordingGuard::default());
        assert_eq!(check.len(), 1);
        assert!(format!("{check:?}").contains("RecordingGuard"));
    }
}
