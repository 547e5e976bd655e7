//! Project configuration for the CLI.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. Built-in defaults ([`ProjectConfig::default`])
//! 2. `twinpack.config.json` in the project directory, or the file given with `--config`
//! 3. `TWINPACK_*` environment variables, with `__` separating nested keys
//!    (`TWINPACK_OUTPUTS__MODERN=dist/index.mjs`)

mod loading;

pub use loading::{load_project, project_figment};
pub use twinpack_bundler::ProjectConfig;

/// Config file looked up in the project directory.
pub const CONFIG_FILE: &str = "twinpack.config.json";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "TWINPACK_";
