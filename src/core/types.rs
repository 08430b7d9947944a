//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`RepoId`] - Namespace and name identifying a repository
//! - [`BranchName`] - Validated branch name
//! - [`Revision`] - Commit identifier used as a precondition or lookup key
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, so nothing downstream has to re-check them.
//!
//! # Examples
//!
//! ```
//! use scm_editor::core::types::{BranchName, RepoId, Revision};
//!
//! let repo: RepoId = "space/repo".parse().unwrap();
//! assert_eq!(repo.namespace(), "space");
//! assert_eq!(repo.name(), "repo");
//!
//! let branch = BranchName::new("feature/docs").unwrap();
//! let rev = Revision::new("rev123").unwrap();
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Revision::new("has space").is_err());
//! # let _ = (branch, rev);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid repository id: {0}")]
    InvalidRepoId(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid revision: {0}")]
    InvalidRevision(String),
}

/// Identifies a repository by namespace and name.
///
/// Rendered and parsed as `namespace/name`. Neither part may be empty or
/// contain `/`, whitespace or control characters.
///
/// # Example
///
/// ```
/// use scm_editor::core::types::RepoId;
///
/// let id = RepoId::new("space", "repo").unwrap();
/// assert_eq!(id.to_string(), "space/repo");
/// assert!(RepoId::new("", "repo").is_err());
/// assert!("no-slash".parse::<RepoId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    namespace: String,
    name: String,
}

impl RepoId {
    /// Create a repository id from its parts.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRepoId` if either part is malformed.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, TypeError> {
        let namespace = namespace.into();
        let name = name.into();
        Self::validate_part(&namespace, "namespace")?;
        Self::validate_part(&name, "name")?;
        Ok(Self { namespace, name })
    }

    fn validate_part(part: &str, what: &str) -> Result<(), TypeError> {
        if part.is_empty() {
            return Err(TypeError::InvalidRepoId(format!("{what} cannot be empty")));
        }
        if part.contains('/') {
            return Err(TypeError::InvalidRepoId(format!(
                "{what} cannot contain '/'"
            )));
        }
        if part.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidRepoId(format!(
                "{what} cannot contain whitespace or control characters"
            )));
        }
        Ok(())
    }

    /// The namespace part.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The name part.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) => Self::new(namespace, name),
            None => Err(TypeError::InvalidRepoId(format!(
                "expected 'namespace/name', got '{s}'"
            ))),
        }
    }
}

impl TryFrom<String> for RepoId {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.to_string()
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A validated branch name.
///
/// Branch names follow git's ref-name rules:
/// - Cannot be empty or exactly `@`
/// - Cannot start with `.` or `-`, or end with `/` or `.lock`
/// - Cannot contain `..`, `@{`, `//`, control characters, or any of
///   ` ~^:\?*[`
/// - No path component may start with `.` or end with `.lock`
///
/// # Example
///
/// ```
/// use scm_editor::core::types::BranchName;
///
/// let name = BranchName::new("feature/my-branch").unwrap();
/// assert_eq!(name.as_str(), "feature/my-branch");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new(".hidden").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates ref-name rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let invalid = |reason: &str| Err(TypeError::InvalidBranchName(reason.to_string()));

        if name.is_empty() {
            return invalid("branch name cannot be empty");
        }
        if name == "@" {
            return invalid("branch name cannot be '@'");
        }
        if name.starts_with('.') || name.starts_with('-') {
            return invalid("branch name cannot start with '.' or '-'");
        }
        if name.ends_with('/') || name.ends_with(".lock") {
            return invalid("branch name cannot end with '/' or '.lock'");
        }
        for sequence in ["..", "@{", "//"] {
            if name.contains(sequence) {
                return Err(TypeError::InvalidBranchName(format!(
                    "branch name cannot contain '{sequence}'"
                )));
            }
        }

        const INVALID_CHARS: [char; 8] = [' ', '~', '^', ':', '\\', '?', '*', '['];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(TypeError::InvalidBranchName(format!(
                "branch name cannot contain '{c}'"
            )));
        }
        if name.chars().any(|c| c.is_ascii_control()) {
            return invalid("branch name cannot contain control characters");
        }

        for component in name.split('/') {
            if component.starts_with('.') || component.ends_with(".lock") {
                return invalid("path component cannot start with '.' or end with '.lock'");
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fully qualified ref for this branch (`refs/heads/<name>`).
    pub fn to_ref(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl FromStr for BranchName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A commit identifier supplied by a caller.
///
/// Revisions are opaque to the editor; they are only compared against
/// identifiers reported by the repository service. A revision matches an
/// identifier when both are equal, or when the revision is an abbreviation
/// of at least [`Revision::MIN_ABBREV`] characters.
///
/// # Example
///
/// ```
/// use scm_editor::core::types::Revision;
///
/// let rev = Revision::new("abc1").unwrap();
/// assert!(rev.matches("abc123def"));
/// assert!(!rev.matches("abd123def"));
///
/// let short = Revision::new("ab").unwrap();
/// assert!(!short.matches("abc123def"));
/// assert!(short.matches("ab"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(String);

impl Revision {
    /// Shortest prefix accepted as an abbreviated revision.
    pub const MIN_ABBREV: usize = 4;

    /// Create a new revision.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidRevision` if the value is empty or contains
    /// whitespace or control characters.
    pub fn new(rev: impl Into<String>) -> Result<Self, TypeError> {
        let rev = rev.into();
        if rev.is_empty() {
            return Err(TypeError::InvalidRevision(
                "revision cannot be empty".into(),
            ));
        }
        if rev.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidRevision(format!(
                "revision cannot contain whitespace: '{rev}'"
            )));
        }
        Ok(Self(rev))
    }

    /// Get the revision as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check whether this revision designates the given full identifier.
    pub fn matches(&self, id: &str) -> bool {
        if self.0 == id {
            return true;
        }
        self.0.len() >= Self::MIN_ABBREV && id.starts_with(&self.0)
    }
}

impl TryFrom<String> for Revision {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl FromStr for Revision {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl From<Revision> for String {
    fn from(rev: Revision) -> Self {
        rev.0
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
