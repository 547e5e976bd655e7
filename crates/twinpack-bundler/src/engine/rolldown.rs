//! Rolldown-backed engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use path_clean::PathClean;
use rolldown::{BundleOutput, BundlerBuilder as RolldownBundlerBuilder, BundlerOptions, InputItem, IsExternal, RawMinifyOptions};
use rolldown_common::{BundlerTransformOptions, Either, Output};

use super::watcher::FileWatcher;
use super::{BuildContext, Engine};
use crate::config::BuildConfig;
use crate::plugins::PluginRegistry;
use crate::runtime::Runtime;
use crate::{Error, Result};

const WATCH_DEBOUNCE: Duration = Duration::from_millis(100);

/// Engine producing [`RolldownContext`]s.
#[derive(Debug, Clone)]
pub struct RolldownEngine {
    runtime: Arc<dyn Runtime>,
}

impl RolldownEngine {
    /// Output files are written through `runtime`.
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self { runtime }
    }
}

#[async_trait]
impl Engine for RolldownEngine {
    async fn create_context(&self, config: BuildConfig) -> Result<Box<dyn BuildContext>> {
        Ok(Box::new(RolldownContext::new(config, Arc::clone(&self.runtime))?))
    }
}

/// Build context for one target.
///
/// A fresh Rolldown bundler is created for every build, so each rebuild emits
/// output from source and never sees a previous build's output.
#[derive(Debug)]
pub struct RolldownContext {
    config: BuildConfig,
    registry: PluginRegistry,
    runtime: Arc<dyn Runtime>,
    builds: AtomicUsize,
    disposed: AtomicBool,
}

impl RolldownContext {
    pub fn new(config: BuildConfig, runtime: Arc<dyn Runtime>) -> Result<Self> {
        if config.entry.as_os_str().is_empty() {
            return Err(Error::InvalidConfig(format!("target '{}' has no entry point", config.name)));
        }
        if config.outfile.file_name().is_none() {
            return Err(Error::InvalidConfig(format!(
                "target '{}' has no output file name",
                config.name
            )));
        }

        let registry = config.plugins.iter().cloned().collect();
        Ok(Self {
            config,
            registry,
            runtime,
            builds: AtomicUsize::new(0),
            disposed: AtomicBool::new(false),
        })
    }

    /// Completed builds so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    fn bundler_options(&self) -> BundlerOptions {
        let config = &self.config;
        let mut options = BundlerOptions {
            format: Some(config.format.to_rolldown()),
            ..Default::default()
        };

        options.input = Some(vec![InputItem {
            name: config
                .outfile
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned()),
            import: config.entry.to_string_lossy().into_owned(),
        }]);
        options.cwd = Some(config.cwd.clone());
        options.platform = Some(config.platform);
        options.external = Some(IsExternal::from(config.external.clone()));
        options.transform = Some(BundlerTransformOptions {
            target: Some(Either::Left(config.target.clone())),
            ..Default::default()
        });
        options.define = Some(
            config
                .define
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        );
        if config.minify {
            options.minify = Some(RawMinifyOptions::from(true));
        }

        options
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.config.cwd.join(path).clean()
        }
    }

    /// Write the bundle: the entry chunk goes to the configured output file,
    /// everything else next to it under its own file name.
    async fn write_output(&self, bundle: &BundleOutput) -> Result<()> {
        let outfile = self.resolve(&self.config.outfile);
        let out_dir = outfile
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.config.cwd.clone());
        self.runtime.create_dir_all(&out_dir).await?;

        let mut wrote_entry = false;
        for output in &bundle.assets {
            let (target, bytes) = match output {
                Output::Chunk(chunk) if chunk.is_entry && !wrote_entry => {
                    wrote_entry = true;
                    (outfile.clone(), chunk.code.as_bytes())
                }
                Output::Chunk(chunk) => (
                    validate_output_path(&out_dir, chunk.filename.as_str())?,
                    chunk.code.as_bytes(),
                ),
                Output::Asset(asset) => (
                    validate_output_path(&out_dir, asset.filename.as_str())?,
                    asset.source.as_bytes(),
                ),
            };

            if let Some(parent) = target.parent() {
                self.runtime.create_dir_all(parent).await?;
            }
            self.runtime.write_file(&target, bytes).await?;
        }

        if !wrote_entry {
            return Err(Error::InvalidConfig(format!(
                "build for '{}' produced no entry chunk",
                self.config.name
            )));
        }
        Ok(())
    }

    fn ignore_patterns(&self) -> Vec<String> {
        let mut ignore = vec!["node_modules".to_string()];
        let outfile = self.resolve(&self.config.outfile);
        if let Some(dir) = outfile.parent().and_then(|p| p.strip_prefix(&self.config.cwd).ok()) {
            if !dir.as_os_str().is_empty() {
                ignore.push(dir.to_string_lossy().into_owned());
            }
        }
        ignore
    }
}

/// Keep emitted files inside the output directory.
fn validate_output_path(base_dir: &Path, filename: &str) -> Result<PathBuf> {
    if filename.contains('\0') {
        return Err(Error::InvalidConfig(format!(
            "output file name contains a null byte: {:?}",
            filename
        )));
    }

    let full_path = base_dir.join(Path::new(filename).clean()).clean();
    if !full_path.starts_with(base_dir) {
        return Err(Error::InvalidConfig(format!(
            "output file '{}' escapes '{}'",
            filename,
            base_dir.display()
        )));
    }
    Ok(full_path)
}

#[async_trait]
impl BuildContext for RolldownContext {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn rebuild(&self) -> Result<()> {
        if self.disposed.load(Ordering::SeqCst) {
            return Err(Error::InvalidConfig(format!(
                "context '{}' was disposed",
                self.config.name
            )));
        }

        let start = Instant::now();
        tracing::debug!(
            target_name = %self.config.name,
            format = %self.config.format,
            plugins = ?self.registry.names(),
            "building"
        );

        let mut bundler = RolldownBundlerBuilder::default()
            .with_options(self.bundler_options())
            .with_plugins(self.registry.to_rolldown_plugins())
            .build()
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        let bundle = bundler
            .generate()
            .await
            .map_err(|e| Error::from_rolldown_batch(&e))?;

        self.write_output(&bundle).await?;
        self.registry.run_end_hooks().await?;

        self.builds.fetch_add(1, Ordering::SeqCst);
        tracing::info!(
            target_name = %self.config.name,
            outfile = %self.config.outfile.display(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "built"
        );
        Ok(())
    }

    async fn watch(&self) -> Result<()> {
        let (_watcher, mut changes) =
            FileWatcher::new(self.config.cwd.clone(), self.ignore_patterns(), WATCH_DEBOUNCE)?;
        tracing::info!(target_name = %self.config.name, root = %self.config.cwd.display(), "watching");

        while let Some(change) = changes.recv().await {
            // Let editors finish writing, then fold the burst into one rebuild.
            tokio::time::sleep(WATCH_DEBOUNCE).await;
            while changes.try_recv().is_ok() {}

            if self.disposed.load(Ordering::SeqCst) {
                break;
            }

            tracing::debug!(target_name = %self.config.name, path = %change.display(), "change detected");
            if let Err(err) = self.rebuild().await {
                tracing::warn!(target_name = %self.config.name, error = %err, "rebuild failed");
            }
        }

        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.disposed.store(true, Ordering::SeqCst);
        tracing::debug!(target_name = %self.config.name, builds = self.build_count(), "disposed");
        Ok(())
    }
}
