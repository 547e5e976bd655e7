//! Bridge from [`BuildPlugin`] load hooks to Rolldown's plugin interface.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use rolldown_common::ModuleType;
use rolldown_plugin::{HookLoadArgs, HookLoadOutput, HookLoadReturn, HookUsage, Plugin, PluginContext};

use super::SharedBuildPlugin;

/// Rolldown plugin that forwards `load` to a [`BuildPlugin`](super::BuildPlugin).
#[derive(Debug, Clone)]
pub struct LoadHookAdapter {
    inner: SharedBuildPlugin,
}

impl LoadHookAdapter {
    pub fn new(inner: SharedBuildPlugin) -> Self {
        Self { inner }
    }
}

impl Plugin for LoadHookAdapter {
    fn name(&self) -> Cow<'static, str> {
        Cow::Owned(self.inner.name().to_string())
    }

    fn register_hook_usage(&self) -> HookUsage {
        HookUsage::Load
    }

    fn load(
        &self,
        _ctx: &PluginContext,
        args: &HookLoadArgs<'_>,
    ) -> impl std::future::Future<Output = HookLoadReturn> + Send {
        let id = args.id.to_string();
        let plugin = Arc::clone(&self.inner);

        async move {
            let matched = plugin
                .load_filter()
                .is_some_and(|filter| filter.is_match(&id));
            if !matched {
                return Ok(None);
            }

            tracing::debug!(plugin = plugin.name(), id = %id, "load hook matched");

            let source = plugin
                .on_load(Path::new(&id))
                .await
                .with_context(|| format!("Plugin '{}' failed to load {}", plugin.name(), id))?;

            Ok(source.map(|code| HookLoadOutput {
                code: code.into(),
                module_type: Some(ModuleType::Js),
                ..Default::default()
            }))
        }
    }
}
