//! Diagnostic extraction from Rolldown errors.
//!
//! Rolldown reports build failures as batched diagnostics whose concrete types
//! are not part of its stable surface. We work from the `Debug` rendering and
//! pull out what the CLI needs to report: a kind, the file, a location and any
//! help line.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Extracted diagnostic information from Rolldown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDiagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub help: Option<String>,
    /// Name of the failing plugin, for [`DiagnosticKind::Plugin`].
    pub plugin: Option<String>,
}

/// Diagnostic kind (subset of Rolldown's event kinds).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    ParseError,
    UnresolvedEntry,
    UnresolvedImport,
    MissingExport,
    Plugin,
    Other,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DiagnosticKind::ParseError => "parse error",
            DiagnosticKind::UnresolvedEntry => "unresolved entry",
            DiagnosticKind::UnresolvedImport => "unresolved import",
            DiagnosticKind::MissingExport => "missing export",
            DiagnosticKind::Plugin => "plugin error",
            DiagnosticKind::Other => "error",
        })
    }
}

/// Extract diagnostics from a Rolldown error.
pub fn extract_from_rolldown_error(error: &dyn std::fmt::Debug) -> Vec<ExtractedDiagnostic> {
    let error_str = format!("{error:?}");

    let parts: Vec<&str> = error_str
        .split("BatchedBuildDiagnostic")
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "[" && *s != "]")
        .collect();

    if parts.len() > 1 {
        parts.into_iter().map(extract_single).collect()
    } else {
        vec![extract_single(&error_str)]
    }
}

fn extract_single(text: &str) -> ExtractedDiagnostic {
    let kind = classify(text);
    let (line, column) = extract_location(text);
    let plugin = if kind == DiagnosticKind::Plugin {
        capture(&PLUGIN_RE, text)
    } else {
        None
    };

    ExtractedDiagnostic {
        kind,
        message: text.to_string(),
        file: capture(&FILE_RE, text),
        line,
        column,
        help: capture(&HELP_RE, text),
        plugin,
    }
}

fn classify(text: &str) -> DiagnosticKind {
    if text.contains("UnresolvedEntry") {
        DiagnosticKind::UnresolvedEntry
    } else if text.contains("UnresolvedImport") || text.contains("Could not resolve") {
        DiagnosticKind::UnresolvedImport
    } else if text.contains("MissingExport") {
        DiagnosticKind::MissingExport
    } else if text.contains("Plugin") || text.contains("plugin") {
        DiagnosticKind::Plugin
    } else if text.contains("Parse") || text.contains("Expected") || text.contains("Unexpected token") {
        DiagnosticKind::ParseError
    } else {
        DiagnosticKind::Other
    }
}

fn capture(re: &Option<Regex>, text: &str) -> Option<String> {
    re.as_ref()?
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_location(text: &str) -> (Option<u32>, Option<u32>) {
    let Some(c) = (*LOCATION_RE).as_ref().and_then(|re| re.captures(text)) else {
        return (None, None);
    };
    (
        c.get(1).and_then(|m| m.as_str().parse().ok()),
        c.get(2).and_then(|m| m.as_str().parse().ok()),
    )
}

// Debug output escapes quotes and newlines, so `\` terminates every capture.
static FILE_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"["'\s]([^"'\s\\]+\.(?:[cm]?js|[cm]?ts|jsx|tsx))(?::\d+)*(?:["'\s,)\\]|$)"#).ok()
});

static LOCATION_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\.(?:[cm]?js|[cm]?ts|jsx|tsx):(\d+):(\d+)").ok());

static HELP_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)(?:help|hint): ([^\n\\"]+)"#).ok());

static PLUGIN_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"[Pp]lugin[ :]+\\?['"]?([\w-]+)"#).ok());

#[cfg(test)]
mod tests {
    use super::*;

    /// Renders like rolldown's batched errors do under `{:?}`.
    struct FakeError(&'static str);

    impl std::fmt::Debug for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.0)
        }
    }

    #[test]
    fn test_unresolved_import() {
        let diags = extract_from_rolldown_error(&FakeError(
            "UnresolvedImport: Could not resolve 'recast' in \"/project/src/index.mjs\"",
        ));

        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, DiagnosticKind::UnresolvedImport);
        assert_eq!(diags[0].file.as_deref(), Some("/project/src/index.mjs"));
    }

    #[test]
    fn test_location_and_help() {
        let diags = extract_from_rolldown_error(&FakeError(
            "Parse error at \"/project/src/index.cjs:12:5\"\nhelp: check the syntax near here",
        ));

        let diag = &diags[0];
        assert_eq!(diag.kind, DiagnosticKind::ParseError);
        assert_eq!(diag.line, Some(12));
        assert_eq!(diag.column, Some(5));
        assert_eq!(diag.help.as_deref(), Some("check the syntax near here"));
    }

    #[test]
    fn test_plugin_name() {
        let diags = extract_from_rolldown_error(&FakeError(
            "Plugin 'patch-recast' failed to load node_modules/recast/lib/patcher.js",
        ));

        assert_eq!(diags[0].kind, DiagnosticKind::Plugin);
        assert_eq!(diags[0].plugin.as_deref(), Some("patch-recast"));
    }

    #[test]
    fn test_batched_split() {
        let diags = extract_from_rolldown_error(&FakeError(
            "BatchedBuildDiagnostic UnresolvedEntry a BatchedBuildDiagnostic MissingExport b",
        ));

        assert_eq!(diags.len(), 2);
        assert_eq!(diags[0].kind, DiagnosticKind::UnresolvedEntry);
        assert_eq!(diags[1].kind, DiagnosticKind::MissingExport);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(DiagnosticKind::UnresolvedEntry.to_string(), "unresolved entry");
    }
}
