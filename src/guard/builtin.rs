//! guard::builtin
//!
//! Configuration-driven guards shipped with the editor.
//!
//! | Guard | Key | Objects when |
//! |-------|-----|--------------|
//! | [`ProtectedPathGuard`] | `protected-path` | a named file matches a protected glob, or a deleted directory may hold one |
//! | [`FileLimitGuard`] | `too-many-files` | a change names more files than allowed |
//! | [`BranchLockGuard`] | `branch-locked` | any change targets a locked branch |
//!
//! [`GuardCheck::from_config`] builds a registry holding only the guards the
//! configuration enables.

use std::collections::BTreeSet;

use glob::Pattern;

use super::{ChangeDescription, Guard, GuardCheck, GuardError, Obstacle};
use crate::core::config::{ConfigError, GuardsConfig};
use crate::core::types::{BranchName, RepoId};

/// Obstacle key for protected files.
pub const PROTECTED_PATH_KEY: &str = "protected-path";

/// Obstacle key for oversized commits.
pub const TOO_MANY_FILES_KEY: &str = "too-many-files";

/// Obstacle key for locked branches.
pub const BRANCH_LOCKED_KEY: &str = "branch-locked";

const GLOB_META: &[char] = &['*', '?', '['];

/// Vetoes any change to files matching one of a set of glob patterns.
///
/// Paths are matched without their leading `/`. Directories checked for creation are
/// not matched: a protected pattern names files, not places.
///
/// A deleted path may be a directory, so it is also vetoed when a pattern
/// can match a file below it: the pattern's literal prefix lies inside the
/// directory, or the pattern ends in a fixed file name that it would match
/// directly under the directory. Patterns ending in a wildcard name, such
/// as `*.lock`, are only matched against the deleted path itself.
#[derive(Debug, Clone)]
pub struct ProtectedPathGuard {
    patterns: Vec<Pattern>,
}

impl ProtectedPathGuard {
    /// Compile the given patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, glob::PatternError> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    fn matching(&self, path: &str) -> Option<&Pattern> {
        let path = path.trim_start_matches('/');
        self.patterns.iter().find(|p| p.matches(path))
    }

    fn matching_below(&self, path: &str) -> Option<&Pattern> {
        let dir = format!("{}/", path.trim_matches('/'));
        self.patterns.iter().find(|p| reaches_below(p, &dir))
    }
}

/// True if `pattern` may match a file below `dir` (which ends in `/`).
fn reaches_below(pattern: &Pattern, dir: &str) -> bool {
    let text = pattern.as_str().trim_start_matches('/');
    let literal = &text[..text.find(GLOB_META).unwrap_or(text.len())];
    if literal.starts_with(dir) {
        return true;
    }
    match text.rsplit('/').next() {
        Some(name) if !name.is_empty() && !name.contains(GLOB_META) && literal != text => {
            pattern.matches(&format!("{dir}{name}"))
        }
        _ => false,
    }
}

impl Guard for ProtectedPathGuard {
    fn name(&self) -> &str {
        "protected-path"
    }

    fn evaluate(
        &self,
        _repository: &RepoId,
        _branch: Option<&BranchName>,
        changes: &ChangeDescription,
    ) -> Result<Vec<Obstacle>, GuardError> {
        let mut obstacles: Vec<Obstacle> = changes
            .all_files()
            .filter_map(|path| {
                self.matching(path).map(|pattern| {
                    Obstacle::new(
                        PROTECTED_PATH_KEY,
                        format!("'{path}' is protected by pattern '{pattern}'"),
                    )
                })
            })
            .collect();

        for path in changes.files_to_delete() {
            if self.matching(path).is_some() {
                continue;
            }
            if let Some(pattern) = self.matching_below(path) {
                obstacles.push(Obstacle::new(
                    PROTECTED_PATH_KEY,
                    format!("'{path}' may contain files protected by pattern '{pattern}'"),
                ));
            }
        }
        Ok(obstacles)
    }
}

/// Vetoes changes that name more than a fixed number of files.
///
/// Only meaningful for batch finalization, where the whole set of files is
/// known; single-file checks never exceed a limit of one or more.
#[derive(Debug, Clone, Copy)]
pub struct FileLimitGuard {
    max: usize,
}

impl FileLimitGuard {
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Guard for FileLimitGuard {
    fn name(&self) -> &str {
        "file-limit"
    }

    fn evaluate(
        &self,
        _repository: &RepoId,
        _branch: Option<&BranchName>,
        changes: &ChangeDescription,
    ) -> Result<Vec<Obstacle>, GuardError> {
        let count = changes.file_count();
        if count > self.max {
            return Ok(vec![Obstacle::new(
                TOO_MANY_FILES_KEY,
                format!(
                    "{count} files exceed the limit of {} per commit",
                    self.max
                ),
            )]);
        }
        Ok(Vec::new())
    }
}

/// Vetoes every change on a set of branches.
///
/// A change without an explicit branch lands on the repository's default
/// branch, so it is checked against that branch when one is known.
#[derive(Debug, Clone, Default)]
pub struct BranchLockGuard {
    locked: BTreeSet<BranchName>,
    default_branch: Option<BranchName>,
}

impl BranchLockGuard {
    pub fn new(locked: impl IntoIterator<Item = BranchName>) -> Self {
        Self {
            locked: locked.into_iter().collect(),
            default_branch: None,
        }
    }

    /// The branch changes without an explicit branch are committed to.
    pub fn with_default_branch(mut self, branch: Option<BranchName>) -> Self {
        self.default_branch = branch;
        self
    }
}

impl Guard for BranchLockGuard {
    fn name(&self) -> &str {
        "branch-lock"
    }

    fn evaluate(
        &self,
        _repository: &RepoId,
        branch: Option<&BranchName>,
        changes: &ChangeDescription,
    ) -> Result<Vec<Obstacle>, GuardError> {
        match branch.or(self.default_branch.as_ref()) {
            Some(branch) if self.locked.contains(branch) && !changes.is_empty() => {
                Ok(vec![Obstacle::new(
                    BRANCH_LOCKED_KEY,
                    format!("branch '{branch}' is locked"),
                )])
            }
            _ => Ok(Vec::new()),
        }
    }
}

impl GuardCheck {
    /// Build a registry from guard settings.
    ///
    /// Guards whose settings are empty are not registered, so the default
    /// configuration yields an empty registry. `default_branch` is the branch
    /// changes without an explicit branch are committed to.
    pub fn from_config(
        config: &GuardsConfig,
        default_branch: Option<&BranchName>,
    ) -> Result<GuardCheck, ConfigError> {
        let mut check = GuardCheck::empty();

        if !config.protected_paths.is_empty() {
            let guard = ProtectedPathGuard::new(config.protected_paths.as_slice())
                .map_err(|e| ConfigError::InvalidValue(format!("invalid protected path: {e}")))?;
            check = check.with_guard(guard);
        }

        if let Some(max) = config.max_files_per_commit {
            check = check.with_guard(FileLimitGuard::new(max));
        }

        if !config.locked_branches.is_empty() {
            let locked = config
                .locked_branches
                .iter()
                .map(|b| {
                    BranchName::new(b.as_str()).map_err(|e| {
                        ConfigError::InvalidValue(format!("invalid locked branch '{b}': {e}"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            check = check.with_guard(
                BranchLockGuard::new(locked).with_default_branch(default_branch.cloned()),
            );
        }

        Ok(check)
    }
}
