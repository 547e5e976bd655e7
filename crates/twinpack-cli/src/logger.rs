//! Logging setup for the Twinpack CLI.
//!
//! Uses `tracing-subscriber` with a compact formatter on stderr. `--verbose`
//! turns on debug output for the twinpack crates, `--quiet` limits output to
//! errors, and otherwise `RUST_LOG` is honoured with an info default.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_FILTER: &str = "twinpack=debug,twinpack_bundler=debug,twinpack_cli=debug";
const QUIET_FILTER: &str = "twinpack=error,twinpack_bundler=error,twinpack_cli=error";
const DEFAULT_FILTER: &str = "twinpack=info,twinpack_bundler=info,twinpack_cli=info";

/// Pick the filter for the given verbosity flags.
///
/// `verbose` wins over `quiet`; clap already rejects passing both.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color && should_use_colors())
        .compact();

    tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .init();
}

/// Whether stderr should get ANSI colors.
///
/// `NO_COLOR` disables colors and `FORCE_COLOR` forces them; otherwise the
/// terminal decides.
pub fn should_use_colors() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    console::Term::stderr().features().colors_supported()
}

#[cfg(test)]
mod tests {
    use super::*;

    // The subscriber is global, so only the filter selection is tested here.

    #[test]
    fn test_verbose_filter_enables_debug() {
        let filter = filter_for(true, false);
        assert!(filter.to_string().contains("twinpack_bundler=debug"));
    }

    #[test]
    fn test_quiet_filter_limits_to_errors() {
        let filter = filter_for(false, true);
        assert!(filter.to_string().contains("twinpack_cli=error"));
    }

    #[test]
    fn test_verbose_wins_over_quiet() {
        let filter = filter_for(true, true);
        assert!(filter.to_string().contains("debug"));
    }
}
