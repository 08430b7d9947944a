//! delete command - Delete a file or directory
//!
//! Guards are consulted first. A vetoed delete never opens the repository.

use anyhow::Result;

use super::{parse_branch, parse_revision, report_commit};
use crate::cli::args::CommitArgs;
use crate::cli::Context;

/// Delete `path` from the branch in one commit.
pub fn delete(
    ctx: &Context,
    path: &str,
    expected_revision: Option<&str>,
    commit: &CommitArgs,
) -> Result<()> {
    let branch = parse_branch(commit.branch.as_deref())?;
    let expected = parse_revision(expected_revision)?;
    let session = ctx.session()?;

    let record = session.editor.delete(
        &session.repository,
        branch.as_ref(),
        path,
        &commit.message,
        expected.as_ref(),
    )?;
    report_commit(ctx, &record)
}
