//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Parses command-specific arguments into domain types
//! 2. Calls the editor to perform or check the change
//! 3. Formats and displays output
//!
//! Handlers never write to the repository themselves.

mod check;
mod completion;
mod delete;
mod editable;
mod modify;
mod move_cmd;
mod upload;

// Re-export command functions for testing and direct invocation
pub use check::check;
pub use completion::completion;
pub use delete::delete;
pub use editable::editable;
pub use modify::modify;
pub use move_cmd::move_file;
pub use upload::upload;

use anyhow::{Context as _, Result};

use crate::cli::args::Command;
use crate::cli::Context;
use crate::core::types::{BranchName, Revision};
use crate::repo::CommitRecord;
use crate::ui::output::{self, Verbosity};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Upload {
            files,
            path,
            modify,
            expected_revision,
            commit,
        } => upload::upload(
            ctx,
            &files,
            &path,
            modify,
            expected_revision.as_deref(),
            &commit,
        ),
        Command::Modify {
            path,
            from,
            expected_revision,
            commit,
        } => modify::modify(
            ctx,
            &path,
            from.as_deref(),
            expected_revision.as_deref(),
            &commit,
        ),
        Command::Delete {
            path,
            expected_revision,
            commit,
        } => delete::delete(ctx, &path, expected_revision.as_deref(), &commit),
        Command::Move { from, to, commit } => move_cmd::move_file(ctx, &from, &to, &commit),
        Command::Check {
            action,
            path,
            branch,
        } => check::check(ctx, action, &path, branch.as_deref()),
        Command::Editable { revision } => editable::editable(ctx, revision.as_deref()),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Parse an optional `--branch` value.
pub(crate) fn parse_branch(branch: Option<&str>) -> Result<Option<BranchName>> {
    branch
        .map(|name| BranchName::new(name).with_context(|| format!("invalid branch '{name}'")))
        .transpose()
}

/// Parse an optional revision argument.
pub(crate) fn parse_revision(revision: Option<&str>) -> Result<Option<Revision>> {
    revision
        .map(|rev| Revision::new(rev).with_context(|| format!("invalid revision '{rev}'")))
        .transpose()
}

/// Show a created commit.
///
/// Quiet mode prints only the full commit id so scripts can capture it.
pub(crate) fn report_commit(ctx: &Context, record: &CommitRecord) -> Result<()> {
    if ctx.json {
        return output::json(record).context("failed to write JSON output");
    }
    match ctx.verbosity() {
        Verbosity::Quiet => println!("{}", record.id),
        verbosity => output::print(output::format_commit(record), verbosity),
    }
    Ok(())
}
