//! Bundling engine seam.
//!
//! The pipeline only needs four operations from a bundler: create a context
//! for a configuration, then rebuild, watch and dispose it. [`RolldownEngine`]
//! is the production implementation.

mod rolldown;
mod watcher;

pub use self::rolldown::{RolldownContext, RolldownEngine};
pub use watcher::FileWatcher;

use async_trait::async_trait;

use crate::config::BuildConfig;
use crate::Result;

/// Creates build contexts.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Create an isolated context for one configuration.
    ///
    /// Plugins attached to `config` are owned by the context from here on.
    async fn create_context(&self, config: BuildConfig) -> Result<Box<dyn BuildContext>>;
}

/// One configuration's bundling handle.
#[async_trait]
pub trait BuildContext: Send + Sync {
    /// Target name the context was created for.
    fn name(&self) -> &str;

    /// Run one full build, then the end-of-build hooks.
    async fn rebuild(&self) -> Result<()>;

    /// Rebuild on every relevant source change. Does not return while the
    /// watcher is alive.
    async fn watch(&self) -> Result<()>;

    /// Release the context. Further rebuilds fail.
    async fn dispose(&self) -> Result<()>;
}
