//! Twinpack CLI entry point.
//!
//! Parses the command line, sets up logging and colors, then runs the build.

use twinpack_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let (args, ignored) = cli::Cli::parse_lenient(std::env::args_os());

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    if !ignored.is_empty() {
        tracing::debug!(?ignored, "ignoring unrecognised arguments");
    }

    commands::build::execute(args)
        .await
        .map_err(error::cli_error_to_miette)
}
