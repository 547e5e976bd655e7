//! Dual-target build orchestration.
//!
//! A run validates the project, derives the legacy and modern configurations
//! from one base, creates a context per configuration and drives them through
//! build, optional watch and dispose. Each phase is issued for both contexts at
//! once and joined before the next phase starts.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use indexmap::IndexMap;

use crate::config::{BaseConfig, BuildConfig, BuildFlags, ConfigOverrides, ModuleFormat, derive_config};
use crate::engine::{BuildContext, Engine};
use crate::plugins::{CopyFilePlugin, DynamicRequirePlugin, PatchSourcePlugin, SharedBuildPlugin};
use crate::project::ProjectConfig;
use crate::runtime::Runtime;
use crate::Result;

/// Stage of a run, attached to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Configure,
    CreateContext,
    Build,
    Watch,
    Dispose,
}

impl Phase {
    /// Diagnostic code reported for failures in this phase.
    pub fn code(self) -> &'static str {
        match self {
            Phase::Configure => "CONFIG_PHASE_FAILED",
            Phase::CreateContext => "CONTEXT_PHASE_FAILED",
            Phase::Build => "BUILD_PHASE_FAILED",
            Phase::Watch => "WATCH_PHASE_FAILED",
            Phase::Dispose => "DISPOSE_PHASE_FAILED",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Phase::Configure => "configuration",
            Phase::CreateContext => "context creation",
            Phase::Build => "initial build",
            Phase::Watch => "watch",
            Phase::Dispose => "dispose",
        })
    }
}

/// Orchestrates one run over a project.
#[derive(Debug, Clone)]
pub struct Pipeline {
    project: ProjectConfig,
    runtime: Arc<dyn Runtime>,
}

impl Pipeline {
    /// `runtime` must be rooted at the project root.
    pub fn new(project: ProjectConfig, runtime: Arc<dyn Runtime>) -> Self {
        Self { project, runtime }
    }

    pub fn project(&self) -> &ProjectConfig {
        &self.project
    }

    /// Settings shared by both targets.
    pub fn base_config(&self, flags: BuildFlags) -> BaseConfig {
        BaseConfig {
            platform: self.project.platform.to_rolldown(),
            target: self.project.target.clone(),
            external: self.project.external.clone(),
            minify: flags.minify,
            cwd: self.runtime.cwd().to_path_buf(),
        }
    }

    /// Derive the legacy and modern configurations, in that order.
    ///
    /// Each target gets its own plugin instances.
    pub fn targets(&self, flags: BuildFlags) -> Result<Vec<BuildConfig>> {
        let base = self.base_config(flags);
        let project = &self.project;

        let legacy = ConfigOverrides {
            name: ModuleFormat::Cjs.label().to_string(),
            entry: self.runtime.resolve_path(&project.entries.legacy),
            outfile: self.runtime.resolve_path(&project.outputs.legacy),
            format: ModuleFormat::Cjs,
            define: IndexMap::from([(project.define_flag.clone(), "false".to_string())]),
            plugins: vec![self.patch_plugin()?, self.types_plugin()],
        };

        let modern_outfile = self.runtime.resolve_path(&project.outputs.modern);
        let modern = ConfigOverrides {
            name: ModuleFormat::Esm.label().to_string(),
            entry: self.runtime.resolve_path(&project.entries.modern),
            outfile: modern_outfile.clone(),
            format: ModuleFormat::Esm,
            define: IndexMap::from([(project.define_flag.clone(), "true".to_string())]),
            plugins: vec![
                self.patch_plugin()?,
                Arc::new(DynamicRequirePlugin::new(Arc::clone(&self.runtime), modern_outfile)),
                self.types_plugin(),
            ],
        };

        Ok(vec![derive_config(&base, legacy), derive_config(&base, modern)])
    }

    fn patch_plugin(&self) -> Result<SharedBuildPlugin> {
        let mut plugin = PatchSourcePlugin::recast(Arc::clone(&self.runtime))?;
        if let Some(filter) = &self.project.patch_filter {
            plugin = plugin.with_filter(filter)?;
        }
        Ok(Arc::new(plugin))
    }

    fn types_plugin(&self) -> SharedBuildPlugin {
        Arc::new(CopyFilePlugin::types(
            Arc::clone(&self.runtime),
            self.project.types.source.clone(),
            self.project.types.destination.clone(),
        ))
    }

    /// Run the pipeline.
    ///
    /// Without `watch` this returns after both contexts are disposed. With
    /// `watch` it returns only if every watcher stops.
    pub async fn run<E>(&self, engine: &E, flags: BuildFlags) -> Result<()>
    where
        E: Engine + ?Sized,
    {
        self.project
            .validate(self.runtime.as_ref())
            .map_err(|e| e.in_phase(Phase::Configure, "project"))?;
        let configs = self
            .targets(flags)
            .map_err(|e| e.in_phase(Phase::Configure, "project"))?;

        tracing::info!(
            targets = ?configs.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            minify = flags.minify,
            watch = flags.watch,
            "starting build"
        );

        let contexts = try_join_all(configs.into_iter().map(|config| async move {
            let name = config.name.clone();
            engine
                .create_context(config)
                .await
                .map_err(|e| e.in_phase(Phase::CreateContext, name))
        }))
        .await?;

        if let Err(err) = for_each_context(&contexts, Phase::Build, |ctx| ctx.rebuild()).await {
            dispose_best_effort(&contexts).await;
            return Err(err);
        }
        tracing::info!("initial build complete");

        if flags.watch {
            if let Err(err) = for_each_context(&contexts, Phase::Watch, |ctx| ctx.watch()).await {
                dispose_best_effort(&contexts).await;
                return Err(err);
            }
            tracing::info!("watchers stopped");
        }

        for_each_context(&contexts, Phase::Dispose, |ctx| ctx.dispose()).await?;
        tracing::debug!("contexts disposed");
        Ok(())
    }
}

/// Run `op` on every context concurrently, failing on the first error.
async fn for_each_context<'a, F, Fut>(
    contexts: &'a [Box<dyn BuildContext>],
    phase: Phase,
    op: F,
) -> Result<()>
where
    F: Fn(&'a dyn BuildContext) -> Fut,
    Fut: std::future::Future<Output = Result<()>> + 'a,
{
    try_join_all(contexts.iter().map(|ctx| {
        let fut = op(ctx.as_ref());
        async move { fut.await.map_err(|e| e.in_phase(phase, ctx.name())) }
    }))
    .await?;
    Ok(())
}

async fn dispose_best_effort(contexts: &[Box<dyn BuildContext>]) {
    for result in join_all(contexts.iter().map(|ctx| ctx.dispose())).await {
        if let Err(err) = result {
            tracing::warn!(error = %err, "dispose after failure also failed");
        }
    }
}
