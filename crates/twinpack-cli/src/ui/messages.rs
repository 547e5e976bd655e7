//! Status message functions for terminal output.

use owo_colors::OwoColorize;

fn styled(text: &str, paint: impl Fn(&str) -> String) -> String {
    if console::colors_enabled_stderr() {
        paint(text)
    } else {
        text.to_string()
    }
}

/// Print a success message to stderr.
pub fn success(message: &str) {
    eprintln!("{} {}", styled("✓", |s| s.green().bold().to_string()), message);
}

/// Print an info message to stderr.
pub fn info(message: &str) {
    eprintln!("{} {}", styled("ℹ", |s| s.blue().bold().to_string()), message);
}

/// Print a warning message to stderr.
pub fn warning(message: &str) {
    eprintln!(
        "{} {}",
        styled("⚠", |s| s.yellow().bold().to_string()),
        styled(message, |s| s.yellow().to_string())
    );
}

/// Print an error message to stderr.
pub fn error(message: &str) {
    eprintln!(
        "{} {}",
        styled("✗", |s| s.red().bold().to_string()),
        styled(message, |s| s.red().to_string())
    );
}
