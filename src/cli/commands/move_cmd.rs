//! move command - Move or rename a file or directory

use anyhow::Result;

use super::{parse_branch, report_commit};
use crate::cli::args::CommitArgs;
use crate::cli::Context;

/// Move `from` to `to` in one commit. `to` must start with `/`.
pub fn move_file(ctx: &Context, from: &str, to: &str, commit: &CommitArgs) -> Result<()> {
    let branch = parse_branch(commit.branch.as_deref())?;
    let session = ctx.session()?;

    let record = session.editor.move_file(
        &session.repository,
        branch.as_ref(),
        from,
        to,
        &commit.message,
    )?;
    report_commit(ctx, &record)
}
