//! Build configuration model.
//!
//! A run owns one immutable [`BaseConfig`] holding everything the two targets
//! share. Each target is produced by [`derive_config`], a pure function that
//! layers a [`ConfigOverrides`] value on top of the base. Nothing in a derived
//! [`BuildConfig`] is shared mutably with the base or with the other target.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::plugins::SharedBuildPlugin;

/// Output module format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    /// Legacy synchronous `require` style (CommonJS).
    Cjs,
    /// Declarative `import`/`export` style (ES modules).
    Esm,
}

impl ModuleFormat {
    /// Convert to Rolldown's output format.
    pub fn to_rolldown(self) -> rolldown::OutputFormat {
        match self {
            ModuleFormat::Cjs => rolldown::OutputFormat::Cjs,
            ModuleFormat::Esm => rolldown::OutputFormat::Esm,
        }
    }

    /// Short label used in logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            ModuleFormat::Cjs => "cjs",
            ModuleFormat::Esm => "esm",
        }
    }
}

impl std::fmt::Display for ModuleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Boolean flags recognized on the command line.
///
/// Parsed once at the process boundary and passed explicitly into the
/// pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFlags {
    /// Minify both artifacts.
    pub minify: bool,
    /// Stay resident and rebuild on change after the initial build.
    pub watch: bool,
}

/// Settings shared by every target of a run.
#[derive(Debug, Clone)]
pub struct BaseConfig {
    /// Target platform (export conditions, builtins).
    pub platform: rolldown::Platform,
    /// Runtime version the output must run on, e.g. `node14.13.0`.
    pub target: String,
    /// Modules left as runtime imports.
    pub external: Vec<String>,
    /// Minification toggle.
    pub minify: bool,
    /// Working directory for module resolution.
    pub cwd: PathBuf,
}

/// Per-target settings layered on top of a [`BaseConfig`].
#[derive(Debug, Clone)]
pub struct ConfigOverrides {
    pub name: String,
    pub entry: PathBuf,
    pub outfile: PathBuf,
    pub format: ModuleFormat,
    pub define: IndexMap<String, String>,
    pub plugins: Vec<SharedBuildPlugin>,
}

/// Fully resolved configuration for one build context.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Target name, used in logs and diagnostics.
    pub name: String,
    pub entry: PathBuf,
    pub outfile: PathBuf,
    pub format: ModuleFormat,
    /// Compile-time constants substituted by the engine.
    pub define: IndexMap<String, String>,
    pub external: Vec<String>,
    pub minify: bool,
    pub platform: rolldown::Platform,
    pub target: String,
    pub cwd: PathBuf,
    /// Plugins in the order their hooks run.
    pub plugins: Vec<SharedBuildPlugin>,
}

impl BuildConfig {
    /// Names of the attached plugins, in order.
    pub fn plugin_names(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }
}

/// Derive a target configuration from the shared base.
///
/// Pure: `base` is only read, and every collection in the result is owned by
/// the result.
pub fn derive_config(base: &BaseConfig, overrides: ConfigOverrides) -> BuildConfig {
    let ConfigOverrides {
        name,
        entry,
        outfile,
        format,
        define,
        plugins,
    } = overrides;

    BuildConfig {
        name,
        entry,
        outfile,
        format,
        define,
        external: base.external.clone(),
        minify: base.minify,
        platform: base.platform,
        target: base.target.clone(),
        cwd: base.cwd.clone(),
        plugins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::CopyFilePlugin;
    use crate::runtime::MemoryRuntime;
    use std::sync::Arc;

    fn base() -> BaseConfig {
        BaseConfig {
            platform: rolldown::Platform::Node,
            target: "node14.13.0".to_string(),
            external: vec!["prettier".to_string()],
            minify: false,
            cwd: PathBuf::from("/project"),
        }
    }

    fn overrides(name: &str, format: ModuleFormat) -> ConfigOverrides {
        let runtime = Arc::new(MemoryRuntime::new("/project"));
        ConfigOverrides {
            name: name.to_string(),
            entry: PathBuf::from(format!("/project/src/index.{name}")),
            outfile: PathBuf::from(format!("/project/dist/index.{name}")),
            format,
            define: IndexMap::from([("__FLAG__".to_string(), "true".to_string())]),
            plugins: vec![Arc::new(CopyFilePlugin::new(runtime, "a", "b"))],
        }
    }

    #[test]
    fn test_derive_copies_shared_fields() {
        let base = base();
        let config = derive_config(&base, overrides("cjs", ModuleFormat::Cjs));

        assert_eq!(config.external, base.external);
        assert_eq!(config.target, "node14.13.0");
        assert!(matches!(config.platform, rolldown::Platform::Node));
        assert!(!config.minify);
        assert_eq!(config.cwd, base.cwd);
    }

    #[test]
    fn test_derive_takes_overrides() {
        let config = derive_config(&base(), overrides("mjs", ModuleFormat::Esm));

        assert_eq!(config.name, "mjs");
        assert_eq!(config.format, ModuleFormat::Esm);
        assert_eq!(config.entry, PathBuf::from("/project/src/index.mjs"));
        assert_eq!(config.outfile, PathBuf::from("/project/dist/index.mjs"));
        assert_eq!(config.define.get("__FLAG__").map(String::as_str), Some("true"));
        assert_eq!(config.plugin_names(), vec!["copy-file"]);
    }

    #[test]
    fn test_derived_configs_do_not_share_defines() {
        let base = base();
        let mut first = derive_config(&base, overrides("cjs", ModuleFormat::Cjs));
        let second = derive_config(&base, overrides("mjs", ModuleFormat::Esm));

        first.define.insert("__OTHER__".to_string(), "1".to_string());
        assert!(!second.define.contains_key("__OTHER__"));
    }

    #[test]
    fn test_format_labels() {
        assert_eq!(ModuleFormat::Cjs.to_string(), "cjs");
        assert_eq!(ModuleFormat::Esm.to_string(), "esm");
        assert!(matches!(ModuleFormat::Esm.to_rolldown(), rolldown::OutputFormat::Esm));
    }
}
