//! upload command - Create or replace several files in one commit

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::{parse_branch, parse_revision, report_commit};
use crate::cli::args::CommitArgs;
use crate::cli::Context;
use crate::core::validation::{ValidationError, FILE_NAME_RULE};
use crate::editor::EditorError;

/// Upload local files into directory `path` of the repository.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `files` - Local files; each keeps its own file name
/// * `path` - Target directory (empty for the repository root)
/// * `modify` - Record the files as modifications instead of creations
/// * `expected_revision` - Fail unless the branch tip is this revision
/// * `commit` - Message and branch
pub fn upload(
    ctx: &Context,
    files: &[PathBuf],
    path: &str,
    modify: bool,
    expected_revision: Option<&str>,
    commit: &CommitArgs,
) -> Result<()> {
    let branch = parse_branch(commit.branch.as_deref())?;
    let expected = parse_revision(expected_revision)?;
    let session = ctx.session()?;

    let mut batch = session.editor.prepare(
        &session.repository,
        branch.as_ref(),
        path,
        &commit.message,
        expected.as_ref(),
    )?;

    for file in files {
        let name = local_file_name(file)?;
        let content = open(file)?;
        if modify {
            batch.modify(name, content)?;
        } else {
            batch.create(name, content)?;
        }
    }

    let record = batch.finalize()?;
    report_commit(ctx, &record)
}

fn local_file_name(file: &Path) -> Result<&str, EditorError> {
    file.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ValidationError::new("file name", FILE_NAME_RULE).into())
}

/// Open a local file, reporting failures as upload errors.
pub(crate) fn open(file: &Path) -> Result<File, EditorError> {
    File::open(file).map_err(|source| EditorError::UploadFailed {
        file: file.display().to_string(),
        source,
    })
}
