//! Twinpack CLI library.
//!
//! The binary in `main.rs` is a thin wrapper around these modules so that the
//! command can be driven from tests.
//!
//! # Modules
//!
//! - [`cli`]: argument definitions and lenient parsing
//! - [`config`]: project configuration loading
//! - [`commands`]: the build command
//! - [`error`]: CLI error types and miette conversion
//! - [`logger`]: tracing setup
//! - [`ui`]: terminal messages

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logger;
pub mod ui;

pub use error::{CliError, ConfigError, Result};
