//! Terminal output helpers.
//!
//! Status lines go to stderr so that stdout stays clean for scripts.

mod format;
mod messages;

pub use format::format_duration;
pub use messages::{error, info, success, warning};

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "CIRCLECI", "TRAVIS"]
        .iter()
        .any(|var| std::env::var_os(var).is_some())
}

/// Initialize color support for status messages.
///
/// `--no-color` and `NO_COLOR` turn colors off, `FORCE_COLOR` turns them on,
/// and otherwise `console` decides from the terminal.
pub fn init_colors(no_color: bool) {
    if no_color || std::env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled_stderr(false);
    } else if std::env::var_os("FORCE_COLOR").is_some() {
        console::set_colors_enabled_stderr(true);
    }
}
