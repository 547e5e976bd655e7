//! Command implementations.
//!
//! Twinpack has a single command, [`build`], which produces the legacy and
//! modern bundles and optionally keeps watching.

pub mod build;

pub use build::execute as build_execute;
