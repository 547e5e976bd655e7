#![cfg_attr(docsrs, feature(doc_cfg))]

//! # twinpack-bundler
//!
//! Dual-target bundling on top of Rolldown.
//!
//! One run produces a legacy CommonJS artifact and a modern ES module artifact
//! from two entry points. Both targets share a base configuration and differ in
//! entry, output, format, compile-time defines and the plugins attached:
//!
//! - [`plugins::PatchSourcePlugin`] rewrites `recast/lib/patcher.js` at load time
//! - [`plugins::DynamicRequirePlugin`] restores `require` in the ESM output
//! - [`plugins::CopyFilePlugin`] copies the hand-written `.d.ts` next to the bundles
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use twinpack_bundler::{BuildFlags, NativeRuntime, Pipeline, ProjectConfig, RolldownEngine};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let project = ProjectConfig::default();
//! let runtime = Arc::new(NativeRuntime::new(&project.root));
//! let engine = RolldownEngine::new(runtime.clone());
//!
//! Pipeline::new(project, runtime)
//!     .run(&engine, BuildFlags { minify: true, watch: false })
//!     .await?;
//! # Ok(()) }
//! ```

pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod pipeline;
pub mod plugins;
pub mod project;
pub mod runtime;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{BaseConfig, BuildConfig, BuildFlags, ConfigOverrides, ModuleFormat, derive_config};
pub use engine::{BuildContext, Engine, RolldownEngine};
pub use pipeline::{Phase, Pipeline};
pub use plugins::{
    BuildPlugin, CopyFilePlugin, DynamicRequirePlugin, PatchRule, PatchSet, PatchSourcePlugin,
    PluginRegistry, SharedBuildPlugin,
};
pub use project::ProjectConfig;
pub use runtime::{MemoryRuntime, NativeRuntime, Runtime, RuntimeError, RuntimeResult};

/// Error types for twinpack-bundler operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Error from Rolldown bundler.
    #[error("Rolldown bundler error: {}", format_bundler_error(.0))]
    Bundler(Vec<diagnostics::ExtractedDiagnostic>),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A required input or output file is missing.
    #[error("File not found: {}", .0.display())]
    FileNotFound(std::path::PathBuf),

    /// Filesystem runtime error.
    #[error(transparent)]
    Runtime(RuntimeError),

    /// A plugin hook failed.
    #[error("Plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    /// File watcher could not be started.
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// A pipeline phase failed; wraps the underlying error.
    #[error("{phase} failed for {target}: {source}")]
    Phase {
        phase: Phase,
        target: String,
        #[source]
        source: Box<Error>,
    },
}

/// Result type alias for twinpack-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a bundler error from a Rolldown error.
    ///
    /// Extracts structured diagnostics from Rolldown's error types.
    pub fn from_rolldown_batch(error: &dyn std::fmt::Debug) -> Self {
        Error::Bundler(diagnostics::extract_from_rolldown_error(error))
    }

    /// Tag this error with the pipeline phase and target it happened in.
    pub fn in_phase(self, phase: Phase, target: impl Into<String>) -> Self {
        Error::Phase {
            phase,
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// The phase this error was raised in, if it was tagged.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Error::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}

impl From<RuntimeError> for Error {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::FileNotFound(path) => Error::FileNotFound(path),
            other => Error::Runtime(other),
        }
    }
}

/// Format bundler error diagnostics for display.
fn format_bundler_error(diagnostics: &[diagnostics::ExtractedDiagnostic]) -> String {
    if diagnostics.is_empty() {
        return "Unknown bundler error".to_string();
    }

    if diagnostics.len() == 1 {
        let diag = &diagnostics[0];
        format!("{}: {}", diag.kind, diag.message)
    } else {
        format!(
            "{} errors: {}",
            diagnostics.len(),
            diagnostics
                .iter()
                .map(|d| format!("{}: {}", d.kind, d.message))
                .collect::<Vec<_>>()
                .join("; ")
        )
    }
}

impl miette::Diagnostic for Error {
    fn code(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        Some(Box::new(match self {
            Error::Bundler(_) => "BUNDLER_ERROR",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::FileNotFound(_) => "FILE_NOT_FOUND",
            Error::Runtime(_) => "RUNTIME_ERROR",
            Error::Plugin { .. } => "PLUGIN_ERROR",
            Error::Watch(_) => "WATCH_ERROR",
            Error::Phase { phase, .. } => phase.code(),
        }))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(miette::Severity::Error)
    }

    fn help(&self) -> Option<Box<dyn std::fmt::Display + '_>> {
        match self {
            Error::InvalidConfig(msg) => Some(Box::new(format!(
                "Check twinpack.config.json and TWINPACK_* variables.\nError: {}",
                msg
            ))),
            Error::FileNotFound(path) => Some(Box::new(format!(
                "'{}' does not exist. If it is a build output, the build that should have produced it failed.",
                path.display()
            ))),
            Error::Bundler(diagnostics) if diagnostics.len() == 1 => diagnostics[0]
                .help
                .as_ref()
                .map(|h| Box::new(h.clone()) as Box<dyn std::fmt::Display>),
            Error::Phase { source, .. } => miette::Diagnostic::help(source.as_ref()),
            _ => None,
        }
    }
}
