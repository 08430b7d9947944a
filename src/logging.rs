//! logging
//!
//! Diagnostic tracing for the `scm-edit` binary.
//!
//! Library code only emits `tracing` events; installing a subscriber is left
//! to the binary. Output goes to stderr so it never mixes with command
//! output on stdout.
//!
//! # Filter
//!
//! `RUST_LOG` wins when set. Otherwise the level is `warn`, or `debug` for
//! this crate when `--debug` is given.
//!
//! ```bash
//! RUST_LOG=scm_editor=trace scm-edit upload docs README.md -m "Add readme"
//! ```

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter without `--debug`.
pub const DEFAULT_FILTER: &str = "warn";

/// Default filter with `--debug`.
pub const DEBUG_FILTER: &str = "warn,scm_editor=debug";

/// Build the event filter for the given flags.
pub fn filter(debug: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if debug { DEBUG_FILTER } else { DEFAULT_FILTER })
    })
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls are ignored.
pub fn init(debug: bool) {
    let _ = tracing_subscriber::registry()
        .with(filter(debug))
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
