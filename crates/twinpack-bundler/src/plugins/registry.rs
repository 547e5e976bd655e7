//! Ordered plugin registry.
//!
//! Plugins keep the order they were registered in. Load hooks are handed to
//! Rolldown in that order, and end-of-build hooks run sequentially in that
//! order after each build.

use std::sync::Arc;

use rolldown_plugin::__inner::SharedPluginable;

use super::{LoadHookAdapter, SharedBuildPlugin};
use crate::{Error, Result};

/// Plugin registry for one build context.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    plugins: Vec<SharedBuildPlugin>,
}

impl PluginRegistry {
    /// Create a new empty plugin registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin at the end of the chain
    pub fn add(&mut self, plugin: SharedBuildPlugin) {
        self.plugins.push(plugin);
    }

    /// Plugin names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    /// Wrap every plugin that has a load hook as a Rolldown plugin
    pub fn to_rolldown_plugins(&self) -> Vec<SharedPluginable> {
        self.plugins
            .iter()
            .filter(|p| p.load_filter().is_some())
            .map(|p| Arc::new(LoadHookAdapter::new(Arc::clone(p))) as SharedPluginable)
            .collect()
    }

    /// Run end-of-build hooks in order.
    ///
    /// Stops at the first failure and reports which plugin failed.
    pub async fn run_end_hooks(&self) -> Result<()> {
        for plugin in self.plugins.iter().filter(|p| p.has_end_hook()) {
            tracing::debug!(plugin = plugin.name(), "running end-of-build hook");
            plugin.on_end().await.map_err(|err| match err {
                // Missing files already carry the path; keep them recognizable.
                Error::FileNotFound(_) => err,
                other => Error::Plugin {
                    plugin: plugin.name().to_string(),
                    message: other.to_string(),
                },
            })?;
        }
        Ok(())
    }

    /// Get the number of plugins in the registry
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl FromIterator<SharedBuildPlugin> for PluginRegistry {
    fn from_iter<I: IntoIterator<Item = SharedBuildPlugin>>(iter: I) -> Self {
        Self {
            plugins: iter.into_iter().collect(),
        }
    }
}
