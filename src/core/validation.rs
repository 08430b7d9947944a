//! core::validation
//!
//! Structural validation of repository paths, file names and commit input.
//!
//! Every check here runs locally before any guard is consulted and before
//! the repository service is touched, so malformed input never reaches an
//! external collaborator.
//!
//! # Rules
//!
//! - A path must not have `..` as a segment, contain `//` or `\`, or equal `..`
//! - A file path (prefix joined with a name) must also be non-empty and must
//!   not end with `/`
//! - A bare file name must be non-empty and must not contain `/`, `\` or `:`
//! - A move target must start with `/`
//!
//! # Example
//!
//! ```
//! use scm_editor::core::validation::{is_path_valid, join_path, validate_file_name};
//!
//! assert!(is_path_valid("docs/README.md"));
//! assert!(!is_path_valid("docs/../secret"));
//! assert!(!is_path_valid("docs//README.md"));
//!
//! assert_eq!(join_path("", "README.md"), "README.md");
//! assert_eq!(join_path("docs", "README.md"), "docs/README.md");
//!
//! assert!(validate_file_name("a:b", "file name").is_err());
//! ```

use thiserror::Error;

/// Rule text reported for unsafe paths.
pub const PATH_RULE: &str = r#"must not contain "..", "//", or "\" and must not equal "..""#;

/// Rule text reported for unsafe file names.
pub const FILE_NAME_RULE: &str = r#"must not contain "/", "\", or ":""#;

/// Rule text reported for empty required values.
pub const NOT_EMPTY_RULE: &str = "must not be empty";

/// Rule text reported for file paths that name a directory.
pub const NOT_DIRECTORY_RULE: &str = r#"must not end with "/""#;

/// Rule text reported for move targets.
pub const ABSOLUTE_RULE: &str = r#"must start with "/""#;

/// A client input that violates a structural rule.
///
/// Validation errors are never retried; they describe which field was wrong
/// and which rule it broke.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field} {rule}")]
pub struct ValidationError {
    /// The name of the offending field (e.g. "path", "target path").
    pub field: String,
    /// Human-readable rule the value violated.
    pub rule: String,
}

impl ValidationError {
    /// Create a validation error for a field.
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
        }
    }
}

/// Check a path against the traversal and separator rules.
///
/// The empty path is valid here (it denotes the repository root); use
/// [`validate_required_path`] where a value is mandatory.
pub fn is_path_valid(path: &str) -> bool {
    if path == ".." || path.contains("//") || path.contains('\\') {
        return false;
    }
    !path.split('/').any(|segment| segment == "..")
}

/// Check a bare file name.
pub fn is_file_name_valid(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\', ':'])
}

/// Validate a possibly empty path.
pub fn validate_path(path: &str, field: &str) -> Result<(), ValidationError> {
    if is_path_valid(path) {
        Ok(())
    } else {
        Err(ValidationError::new(field, PATH_RULE))
    }
}

/// Validate a path that must be present.
pub fn validate_required_path(path: &str, field: &str) -> Result<(), ValidationError> {
    validate_not_empty(path, field)?;
    validate_path(path, field)
}

/// Validate the full path of a single file.
pub fn validate_file_path(path: &str, field: &str) -> Result<(), ValidationError> {
    validate_required_path(path, field)?;
    if path.ends_with('/') {
        return Err(ValidationError::new(field, NOT_DIRECTORY_RULE));
    }
    Ok(())
}

/// Validate a bare file name.
pub fn validate_file_name(name: &str, field: &str) -> Result<(), ValidationError> {
    validate_not_empty(name, field)?;
    if is_file_name_valid(name) {
        Ok(())
    } else {
        Err(ValidationError::new(field, FILE_NAME_RULE))
    }
}

/// Validate the target of a move: required, safe and rooted at `/`.
pub fn validate_move_target(path: &str, field: &str) -> Result<(), ValidationError> {
    validate_required_path(path, field)?;
    if !path.starts_with('/') {
        return Err(ValidationError::new(field, ABSOLUTE_RULE));
    }
    Ok(())
}

/// Validate that a value is not empty.
pub fn validate_not_empty(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::new(field, NOT_EMPTY_RULE))
    } else {
        Ok(())
    }
}

/// Compose a file path from a target prefix and a name.
///
/// An empty prefix yields the bare name; otherwise the parts are joined with
/// a single `/`. The result is not validated.
pub fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// Split a file path into its directory prefix and file name.
///
/// ```
/// use scm_editor::core::validation::split_path;
///
/// assert_eq!(split_path("docs/guide/intro.md"), ("docs/guide", "intro.md"));
/// assert_eq!(split_path("README.md"), ("", "README.md"));
/// ```
pub fn split_path(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((dir, name)) => (dir, name),
        None => ("", path),
    }
}
