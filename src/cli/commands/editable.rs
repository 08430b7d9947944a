//! editable command - Report whether the repository can be edited

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::parse_revision;
use crate::cli::Context;
use crate::ui::output::{self, Verbosity};

#[derive(Debug, Serialize)]
struct EditableReport<'a> {
    repository: String,
    revision: Option<&'a str>,
    editable: bool,
}

/// Print whether the repository is editable, optionally at `revision`.
///
/// The exit code is 0 either way. Quiet mode prints `true` or `false`.
pub fn editable(ctx: &Context, revision: Option<&str>) -> Result<()> {
    let parsed = parse_revision(revision)?;
    let session = ctx.session()?;

    let editable = session
        .preconditions
        .is_editable(&session.repository, parsed.as_ref())?;

    if ctx.json {
        return output::json(&EditableReport {
            repository: session.repository.to_string(),
            revision,
            editable,
        })
        .context("failed to write JSON output");
    }

    if ctx.verbosity() == Verbosity::Quiet {
        println!("{editable}");
        return Ok(());
    }

    let answer = if editable { "editable" } else { "not editable" };
    let target = match revision {
        Some(rev) => format!("{} at {rev}", session.repository),
        None => session.repository.to_string(),
    };
    output::print(format!("{target}: {answer}"), ctx.verbosity());
    Ok(())
}
