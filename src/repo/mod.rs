//! repo
//!
//! Access to version-controlled repositories.
//!
//! # Architecture
//!
//! The editor talks to repositories only through the traits in this module.
//! It never opens a repository itself; it asks a [`RepositoryServiceFactory`]
//! for a connection and hands that connection a [`Modification`].
//!
//! # Modules
//!
//! - `traits`: the service contract, modification builder and records
//! - [`git`]: local git repositories through `git2`
//! - [`mock`]: in-memory implementation for deterministic testing

pub mod git;
pub mod mock;
mod traits;

pub use traits::*;
