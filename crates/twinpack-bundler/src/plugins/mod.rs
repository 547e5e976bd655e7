//! Build plugins.
//!
//! A [`BuildPlugin`] has up to two hooks:
//!
//! - a load interceptor, active for module ids matching [`BuildPlugin::load_filter`],
//!   that may return replacement source for the module
//! - an end-of-build callback, run after every completed build of the context
//!   the plugin is attached to
//!
//! Plugins capture every input at construction and hold no state between
//! invocations.

mod adapter;
mod copy_file;
mod patch_source;
mod registry;
mod rewrite_output;

pub use adapter::LoadHookAdapter;
pub use copy_file::CopyFilePlugin;
pub use patch_source::{PatchRule, PatchSet, PatchSourcePlugin, RECAST_TEMPLATE_ELEMENT};
pub use registry::PluginRegistry;
pub use rewrite_output::{DynamicRequirePlugin, DynamicRequireRewrite};

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::Result;

/// A named unit of build behavior.
#[async_trait]
pub trait BuildPlugin: std::fmt::Debug + Send + Sync {
    /// Stable plugin name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Module ids this plugin wants to load. `None` means no load hook.
    fn load_filter(&self) -> Option<&Regex> {
        None
    }

    /// Produce replacement source for a matched module.
    ///
    /// Returning `Ok(None)` declines, and the engine loads the module normally.
    async fn on_load(&self, _path: &Path) -> Result<Option<String>> {
        Ok(None)
    }

    /// Whether [`BuildPlugin::on_end`] does anything.
    fn has_end_hook(&self) -> bool {
        false
    }

    /// Called after each completed build.
    async fn on_end(&self) -> Result<()> {
        Ok(())
    }
}

/// Plugins are shared between the registry and the engine adapters.
pub type SharedBuildPlugin = Arc<dyn BuildPlugin>;
