//! Test doubles for driving a [`Pipeline`](crate::Pipeline) without bundling.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::config::BuildConfig;
use crate::engine::{BuildContext, Engine};
use crate::{Error, Result};

pub use crate::runtime::MemoryRuntime;

/// Lifecycle call seen by a [`RecordingEngine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    Create,
    Rebuild,
    Watch,
    Dispose,
}

#[derive(Debug, Default)]
struct Journal {
    configs: Vec<BuildConfig>,
    calls: Vec<(String, Call)>,
    failing: FxHashMap<String, Call>,
}

/// Engine that records lifecycle calls instead of bundling.
///
/// `rebuild` runs the context's end-of-build hooks, so plugins attached to the
/// configuration still see every build. `watch` never completes.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    journal: Arc<Mutex<Journal>>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `call` fail for the target named `target`.
    pub fn fail_on(&self, target: &str, call: Call) {
        self.journal.lock().failing.insert(target.to_string(), call);
    }

    /// Configurations passed to `create_context`, in call order.
    pub fn configs(&self) -> Vec<BuildConfig> {
        self.journal.lock().configs.clone()
    }

    /// Number of `call`s made on the context for `target`.
    pub fn count(&self, target: &str, call: Call) -> usize {
        self.journal
            .lock()
            .calls
            .iter()
            .filter(|(name, c)| name == target && *c == call)
            .count()
    }

    /// Total number of `call`s across all contexts.
    pub fn total(&self, call: Call) -> usize {
        self.journal.lock().calls.iter().filter(|(_, c)| *c == call).count()
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<(String, Call)> {
        self.journal.lock().calls.clone()
    }
}

#[async_trait]
impl Engine for RecordingEngine {
    async fn create_context(&self, config: BuildConfig) -> Result<Box<dyn BuildContext>> {
        let name = config.name.clone();
        let registry = config.plugins.iter().cloned().collect();
        {
            let mut journal = self.journal.lock();
            journal.calls.push((name.clone(), Call::Create));
            journal.configs.push(config);
        }
        Ok(Box::new(RecordingContext {
            name,
            registry,
            journal: Arc::clone(&self.journal),
        }))
    }
}

struct RecordingContext {
    name: String,
    registry: crate::plugins::PluginRegistry,
    journal: Arc<Mutex<Journal>>,
}

impl RecordingContext {
    fn record(&self, call: Call) -> Result<()> {
        let mut journal = self.journal.lock();
        journal.calls.push((self.name.clone(), call));
        if journal.failing.get(&self.name) == Some(&call) {
            return Err(Error::InvalidConfig(format!("{:?} failed for {}", call, self.name)));
        }
        Ok(())
    }
}

#[async_trait]
impl BuildContext for RecordingContext {
    fn name(&self) -> &str {
        &self.name
    }

    async fn rebuild(&self) -> Result<()> {
        self.record(Call::Rebuild)?;
        self.registry.run_end_hooks().await
    }

    async fn watch(&self) -> Result<()> {
        self.record(Call::Watch)?;
        std::future::pending::<()>().await;
        Ok(())
    }

    async fn dispose(&self) -> Result<()> {
        self.record(Call::Dispose)
    }
}
