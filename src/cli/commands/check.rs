//! check command - Dry-run a change against the guards
//!
//! Nothing is written and the repository is never opened. A change with
//! obstacles fails with the same error, and exit code, as the real change
//! would.

use anyhow::{Context as _, Result};
use serde::Serialize;

use super::parse_branch;
use crate::cli::args::CheckAction;
use crate::cli::Context;
use crate::editor::{ChangeNotAllowed, EditorError};
use crate::guard::Obstacle;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct CheckReport<'a> {
    repository: String,
    action: &'static str,
    path: &'a str,
    allowed: bool,
    obstacles: Vec<&'a Obstacle>,
}

fn action_name(action: CheckAction) -> &'static str {
    match action {
        CheckAction::Delete => "delete",
        CheckAction::Modify => "modify",
        CheckAction::Create => "create",
    }
}

/// Report the obstacles to `action` on `path`.
pub fn check(ctx: &Context, action: CheckAction, path: &str, branch: Option<&str>) -> Result<()> {
    let branch = parse_branch(branch)?;
    let session = ctx.session()?;
    let editor = &session.editor;
    let repository = &session.repository;

    let obstacles = match action {
        CheckAction::Delete => editor.is_deletable(repository, branch.as_ref(), path)?,
        CheckAction::Modify => editor.is_modifiable(repository, branch.as_ref(), path)?,
        CheckAction::Create => editor.can_create_files_in(repository, branch.as_ref(), path)?,
    };

    if ctx.json {
        output::json(&CheckReport {
            repository: repository.to_string(),
            action: action_name(action),
            path,
            allowed: obstacles.is_empty(),
            obstacles: obstacles.iter().collect(),
        })
        .context("failed to write JSON output")?;
    } else if obstacles.is_empty() {
        output::print(
            format!("{} {path}: allowed", action_name(action)),
            ctx.verbosity(),
        );
    }

    if obstacles.is_empty() {
        return Ok(());
    }
    Err(EditorError::from(ChangeNotAllowed {
        repository: repository.clone(),
        branch,
        path: path.to_string(),
        obstacles,
    })
    .into())
}
