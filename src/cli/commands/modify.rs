//! modify command - Replace the content of one file

use std::io::{self, Read};
use std::path::Path;

use anyhow::Result;

use super::upload::open;
use super::{parse_branch, parse_revision, report_commit};
use crate::cli::args::CommitArgs;
use crate::cli::Context;

/// Replace the file at `path` with the content of `from`, or stdin.
pub fn modify(
    ctx: &Context,
    path: &str,
    from: Option<&Path>,
    expected_revision: Option<&str>,
    commit: &CommitArgs,
) -> Result<()> {
    let branch = parse_branch(commit.branch.as_deref())?;
    let expected = parse_revision(expected_revision)?;
    let session = ctx.session()?;

    let content: Box<dyn Read> = match from {
        Some(file) => Box::new(open(file)?),
        None => Box::new(io::stdin().lock()),
    };

    let record = session.editor.modify_file(
        &session.repository,
        branch.as_ref(),
        path,
        content,
        &commit.message,
        expected.as_ref(),
    )?;
    report_commit(ctx, &record)
}
