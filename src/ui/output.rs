//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Output is formatted consistently and respects the quiet flag.
//! When `--json` is enabled, results are printed as machine-readable JSON
//! on stdout regardless of verbosity.

use std::fmt::Display;

use serde::Serialize;

use crate::repo::CommitRecord;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a value as pretty JSON.
pub fn json<T: Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Format a created commit for display.
pub fn format_commit(record: &CommitRecord) -> String {
    let summary = record.message.lines().next().unwrap_or("");
    let mut out = format!("[{}] {}", short_id(&record.id), summary);
    if let Some(branch) = &record.branch {
        out.push_str(&format!("\n  branch: {branch}"));
    }
    out.push_str(&format!(
        "\n  author: {} <{}>\n  date:   {}",
        record.author.name,
        record.author.email,
        record.timestamp.to_rfc3339()
    ));
    out
}

/// Abbreviate a commit id for display.
pub fn short_id(id: &str) -> &str {
    id.get(..7).unwrap_or(id)
}
