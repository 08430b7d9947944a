//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! The editor has two configuration scopes:
//! - **Global**: User-level settings (author, guards, permissions)
//! - **Repo**: Repository-level guard settings
//!
//! # Precedence
//!
//! Guard settings from the repo file extend the global ones (see
//! [`GuardsConfig::merge`]). Author and permissions are global only.
//! CLI flags are not handled here.
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$SCM_EDIT_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/scm-edit/config.toml`
//! 3. `~/.scm-edit/config.toml`
//!
//! # Repo Config Location
//!
//! `<git-dir>/scm-edit/config.toml`, where the git dir is `.git` inside a
//! working tree or the repository directory itself when bare.
//!
//! # Example
//!
//! ```no_run
//! use scm_editor::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo"))).unwrap();
//! let guards = result.config.guards();
//! println!("protected: {:?}", guards.protected_paths);
//! ```

pub mod schema;

pub use schema::{AuthorConfig, GlobalConfig, GuardsConfig, PermissionsConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::types::RepoId;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "SCM_EDIT_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
}

/// Merged configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if found)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `repo_path` is provided, also loads the repository's config.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. Missing files are not an error.
    pub fn load(repo_path: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let global_path = Self::find_global();
        Self::load_from(global_path.as_deref(), repo_path)
    }

    /// Load configuration from an explicit global file and repository path.
    pub fn load_from(
        global_file: Option<&Path>,
        repo_path: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let (global, global_path) = match global_file {
            Some(path) if path.exists() => {
                (read_toml::<GlobalConfig>(path)?, Some(path.to_path_buf()))
            }
            _ => (GlobalConfig::default(), None),
        };

        let (repo, repo_path_found) = match repo_path.map(Self::repo_config_path) {
            Some(path) if path.exists() => (Some(read_toml::<RepoConfig>(&path)?), Some(path)),
            _ => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                global_path,
                repo_path: repo_path_found,
            },
        })
    }

    /// Locate the global config file, if any.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("scm-edit/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".scm-edit/config.toml"))
            .filter(|path| path.exists())
    }

    /// Get the config path for a repository.
    ///
    /// Returns `<repo>/.git/scm-edit/config.toml` for working trees and
    /// `<repo>/scm-edit/config.toml` for bare repositories.
    pub fn repo_config_path(repo_path: &Path) -> PathBuf {
        let dot_git = repo_path.join(".git");
        let git_dir = if dot_git.is_dir() {
            dot_git
        } else {
            repo_path.to_path_buf()
        };
        git_dir.join("scm-edit/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// The configured commit author, if any.
    pub fn author(&self) -> Option<&AuthorConfig> {
        self.global.author.as_ref()
    }

    /// Guard settings with repository settings merged over global ones.
    pub fn guards(&self) -> GuardsConfig {
        let global = self.global.guards.clone().unwrap_or_default();
        match self.repo.as_ref().and_then(|r| r.guards.as_ref()) {
            Some(repo) => global.merge(repo),
            None => global,
        }
    }

    /// Repositories configured as read-only.
    ///
    /// Entries were validated on load; anything unparsable is skipped.
    pub fn read_only_repositories(&self) -> Vec<RepoId> {
        self.global
            .permissions
            .as_ref()
            .map(|p| p.read_only.iter().filter_map(|s| s.parse().ok()).collect())
            .unwrap_or_default()
    }

    /// Path of the global config file that was loaded.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Path of the repository config file that was loaded.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
