//! scm-edit binary entry point.

use std::process::ExitCode;

use scm_editor::cli::{self, Cli};
use scm_editor::logging;
use scm_editor::ui::output;

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    logging::init(cli.debug);

    match cli::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{err:#}"));
            ExitCode::from(cli::exit_code(&err))
        }
    }
}
