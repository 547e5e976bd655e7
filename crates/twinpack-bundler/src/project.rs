//! Project layout: where the entries, outputs and declarations live.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::runtime::Runtime;
use crate::{Error, Result};

/// One path per target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetPaths {
    /// CommonJS target.
    pub legacy: PathBuf,
    /// ES module target.
    pub modern: PathBuf,
}

/// Hand-written declaration file copied next to the bundles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypesConfig {
    pub source: PathBuf,
    pub destination: PathBuf,
}

/// Platform name as written in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformName {
    Node,
    Browser,
}

impl PlatformName {
    pub fn to_rolldown(self) -> rolldown::Platform {
        match self {
            PlatformName::Node => rolldown::Platform::Node,
            PlatformName::Browser => rolldown::Platform::Browser,
        }
    }
}

/// Project settings. Relative paths are relative to `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub root: PathBuf,
    pub entries: TargetPaths,
    pub outputs: TargetPaths,
    pub types: TypesConfig,
    /// Modules left as runtime imports.
    pub external: Vec<String>,
    pub platform: PlatformName,
    pub target: String,
    /// Define set to `"false"` for the legacy target and `"true"` for the modern one.
    pub define_flag: String,
    /// Overrides the module id pattern of the recast patch.
    pub patch_filter: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            entries: TargetPaths {
                legacy: PathBuf::from("src/index.cjs"),
                modern: PathBuf::from("src/index.mjs"),
            },
            outputs: TargetPaths {
                legacy: PathBuf::from("dist/index.js"),
                modern: PathBuf::from("dist/index.mjs"),
            },
            types: TypesConfig {
                source: PathBuf::from("src/index.d.ts"),
                destination: PathBuf::from("dist/index.d.ts"),
            },
            external: vec!["prettier".to_string()],
            platform: PlatformName::Node,
            target: "node14.13.0".to_string(),
            define_flag: "__IS_PRETTIER_3__".to_string(),
            patch_filter: None,
        }
    }
}

impl ProjectConfig {
    /// Check the layout before anything is built.
    ///
    /// Inputs must exist; the two targets must not share an entry or an output.
    pub fn validate(&self, runtime: &dyn Runtime) -> Result<()> {
        for (label, path) in [
            ("legacy entry", &self.entries.legacy),
            ("modern entry", &self.entries.modern),
            ("type declarations", &self.types.source),
        ] {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig(format!("{} path is empty", label)));
            }
            if !runtime.exists(path) {
                return Err(Error::FileNotFound(runtime.resolve_path(path)));
            }
        }

        if runtime.resolve_path(&self.entries.legacy) == runtime.resolve_path(&self.entries.modern) {
            return Err(Error::InvalidConfig(format!(
                "legacy and modern targets share the entry point '{}'",
                self.entries.legacy.display()
            )));
        }

        let outputs = [
            &self.outputs.legacy,
            &self.outputs.modern,
            &self.types.destination,
        ];
        for (i, a) in outputs.iter().enumerate() {
            if a.as_os_str().is_empty() || a.file_name().is_none() {
                return Err(Error::InvalidConfig(format!(
                    "output path '{}' has no file name",
                    a.display()
                )));
            }
            for b in &outputs[i + 1..] {
                if runtime.resolve_path(a) == runtime.resolve_path(b) {
                    return Err(Error::InvalidConfig(format!(
                        "output path '{}' is used twice",
                        a.display()
                    )));
                }
            }
        }

        if self.define_flag.trim().is_empty() {
            return Err(Error::InvalidConfig("define_flag must not be empty".to_string()));
        }

        Ok(())
    }
}
