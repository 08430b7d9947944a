//! scm-editor - Guarded, atomic file commits against version-controlled repositories
//!
//! Clients create, modify, delete and move files without a working copy.
//! Each request becomes exactly one commit, or nothing at all when a guard
//! objects, the caller may not write, or the branch moved underneath.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface (parses args, delegates to the editor)
//! - [`editor`] - Editing operations, batches and editability checks
//! - [`guard`] - Pluggable veto checks and the built-in guards
//! - [`repo`] - Repository service abstraction, git backend and mock
//! - [`auth`] - Write permission checks
//! - [`core`] - Domain types, validation and configuration
//! - [`logging`] - Tracing subscriber setup for the binary
//! - [`ui`] - Output formatting
//!
//! # Invariants
//!
//! 1. Unsafe paths are rejected before guards or the repository are consulted
//! 2. Any obstacle from any guard prevents the commit
//! 3. One request produces at most one commit
//! 4. Every repository connection is closed, on success and on failure

pub mod auth;
pub mod cli;
pub mod core;
pub mod editor;
pub mod guard;
pub mod logging;
pub mod repo;
pub mod ui;
