//! core
//!
//! Core domain types, validation rules and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: RepoId, BranchName, Revision
//! - [`validation`] - Path, file name and commit input rules
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at construction time
//! - Validation is local and runs before any external call

pub mod config;
pub mod types;
pub mod validation;
