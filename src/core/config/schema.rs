//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$SCM_EDIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/scm-edit/config.toml`
//! 3. `~/.scm-edit/config.toml`
//!
//! # Repo Config
//!
//! Located at `<git-dir>/scm-edit/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing: branch names must be valid,
//! repository ids must parse, and glob patterns must compile.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{BranchName, RepoId};

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// [author]
/// name = "Jane Doe"
/// email = "jane@example.com"
///
/// [guards]
/// protected_paths = ["LICENSE", ".github/**"]
/// max_files_per_commit = 50
/// locked_branches = ["release"]
///
/// [permissions]
/// read_only = ["archive/legacy"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Identity recorded on created commits
    pub author: Option<AuthorConfig>,

    /// Built-in guard settings
    pub guards: Option<GuardsConfig>,

    /// Write permission settings
    pub permissions: Option<PermissionsConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(author) = &self.author {
            author.validate()?;
        }
        if let Some(guards) = &self.guards {
            guards.validate()?;
        }
        if let Some(permissions) = &self.permissions {
            permissions.validate()?;
        }
        Ok(())
    }
}

/// Repository configuration.
///
/// Only guard settings can be set per repository; they extend the global
/// ones rather than replacing them.
///
/// ```toml
/// [guards]
/// protected_paths = ["db/migrations/**"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Repository-specific guard settings
    pub guards: Option<GuardsConfig>,
}

impl RepoConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(guards) = &self.guards {
            guards.validate()?;
        }
        Ok(())
    }
}

/// Commit author identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: String,
    pub email: String,
}

impl AuthorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "author.name cannot be empty".into(),
            ));
        }
        if !self.email.contains('@') {
            return Err(ConfigError::InvalidValue(format!(
                "author.email '{}' is not an email address",
                self.email
            )));
        }
        Ok(())
    }
}

/// Settings for the built-in guards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GuardsConfig {
    /// Glob patterns of files that must not be changed
    pub protected_paths: Vec<String>,

    /// Upper bound on files touched by one commit
    pub max_files_per_commit: Option<usize>,

    /// Branches that accept no changes at all
    pub locked_branches: Vec<String>,
}

impl GuardsConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.protected_paths {
            glob::Pattern::new(pattern).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid protected path '{pattern}': {e}"))
            })?;
        }
        if self.max_files_per_commit == Some(0) {
            return Err(ConfigError::InvalidValue(
                "max_files_per_commit must be at least 1".into(),
            ));
        }
        for branch in &self.locked_branches {
            BranchName::new(branch.as_str()).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid locked branch '{branch}': {e}"))
            })?;
        }
        Ok(())
    }

    /// Combine two guard settings.
    ///
    /// Lists are unioned (order kept, duplicates dropped) and the smaller
    /// file limit wins.
    pub fn merge(&self, other: &GuardsConfig) -> GuardsConfig {
        let mut merged = self.clone();
        for pattern in &other.protected_paths {
            if !merged.protected_paths.contains(pattern) {
                merged.protected_paths.push(pattern.clone());
            }
        }
        for branch in &other.locked_branches {
            if !merged.locked_branches.contains(branch) {
                merged.locked_branches.push(branch.clone());
            }
        }
        merged.max_files_per_commit = match (self.max_files_per_commit, other.max_files_per_commit)
        {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        merged
    }
}

/// Write permission settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionsConfig {
    /// Repositories (`namespace/name`) that must not be written to
    pub read_only: Vec<String>,
}

impl PermissionsConfig {
    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for id in &self.read_only {
            id.parse::<RepoId>().map_err(|e| {
                ConfigError::InvalidValue(format!("invalid read-only repository '{id}': {e}"))
            })?;
        }
        Ok(())
    }
}
