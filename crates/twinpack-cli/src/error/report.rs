//! Miette rendering for CLI errors.

use crate::error::CliError;
use miette::Report;

/// Convert a [`CliError`] into a report for the terminal.
///
/// Bundler errors keep their diagnostic code and help text.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Build(e) => Report::new(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        other => miette::miette!("{}", other),
    }
}
