//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--repo <path>`: Repository to edit (default: the current directory)
//! - `--id <namespace/name>`: Repository identity used by guards and permissions
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--json`: Machine-readable output

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// scm-edit - Guarded, atomic file commits without a working tree
#[derive(Parser, Debug)]
#[command(name = "scm-edit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository to edit (working tree or bare); defaults to the current directory
    #[arg(long, global = true, value_name = "PATH")]
    pub repo: Option<PathBuf>,

    /// Repository identity as namespace/name; defaults to <parent-dir>/<dir>
    #[arg(long, global = true, value_name = "NS/NAME")]
    pub id: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Options shared by every committing command.
#[derive(clap::Args, Debug, Clone)]
pub struct CommitArgs {
    /// Commit message
    #[arg(short, long)]
    pub message: String,

    /// Target branch (default: the branch HEAD points to)
    #[arg(short, long)]
    pub branch: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create or replace files in one commit
    #[command(
        name = "upload",
        long_about = "Create or replace files in one commit.\n\n\
            Every local file is stored under the target directory with its own \
            file name. Guards see the whole batch at once; if any objects, nothing \
            is committed.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Add two guides under docs/
    scm-edit upload --path docs intro.md setup.md -m \"Add guides\"

    # Only commit if main has not moved
    scm-edit upload notes.txt -m \"Notes\" -b main --expected-revision 3f2a9c1"
    )]
    Upload {
        /// Local files to upload
        #[arg(required = true, value_name = "FILE")]
        files: Vec<PathBuf>,

        /// Target directory in the repository (default: repository root)
        #[arg(short, long, default_value = "")]
        path: String,

        /// Record the files as modifications of existing files
        #[arg(long)]
        modify: bool,

        /// Fail unless the branch tip is this revision
        #[arg(long, value_name = "REV")]
        expected_revision: Option<String>,

        #[command(flatten)]
        commit: CommitArgs,
    },

    /// Replace the content of one file
    #[command(
        name = "modify",
        after_help = "\
WORKFLOW EXAMPLES:
    # Replace README.md with the content of a local file
    scm-edit modify README.md --from ./README.md -m \"Update readme\"

    # Read new content from stdin
    echo hello | scm-edit modify docs/hello.txt -m \"Say hello\""
    )]
    Modify {
        /// File path in the repository
        path: String,

        /// Local file to read the new content from (default: stdin)
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,

        /// Fail unless the branch tip is this revision
        #[arg(long, value_name = "REV")]
        expected_revision: Option<String>,

        #[command(flatten)]
        commit: CommitArgs,
    },

    /// Delete a file or directory
    Delete {
        /// Path in the repository
        path: String,

        /// Fail unless the branch tip is this revision
        #[arg(long, value_name = "REV")]
        expected_revision: Option<String>,

        #[command(flatten)]
        commit: CommitArgs,
    },

    /// Move or rename a file or directory
    #[command(
        name = "move",
        after_help = "\
WORKFLOW EXAMPLES:
    # Rename a file; the target must start with /
    scm-edit move docs/old.md /docs/new.md -m \"Rename guide\""
    )]
    Move {
        /// Path to move
        from: String,

        /// New path, starting with /
        to: String,

        #[command(flatten)]
        commit: CommitArgs,
    },

    /// Ask the guards whether a change would be allowed, without changing anything
    Check {
        /// Kind of change to check
        #[arg(value_enum)]
        action: CheckAction,

        /// Path in the repository (a directory for `create`)
        path: String,

        /// Branch the change would target
        #[arg(short, long)]
        branch: Option<String>,
    },

    /// Report whether the repository can be edited, optionally at a revision
    Editable {
        /// Revision being viewed
        revision: Option<String>,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    scm-edit completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    scm-edit completion zsh >> ~/.zshrc

    # Fish
    scm-edit completion fish > ~/.config/fish/completions/scm-edit.fish"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Change kinds understood by `check`.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckAction {
    /// Deleting the path
    Delete,
    /// Modifying the file at the path
    Modify,
    /// Creating files in the directory at the path
    Create,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
