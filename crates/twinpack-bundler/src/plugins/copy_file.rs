use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use super::BuildPlugin;
use crate::runtime::Runtime;
use crate::Result;

/// End-of-build hook copying one file, e.g. a hand-written `.d.ts`.
#[derive(Debug)]
pub struct CopyFilePlugin {
    name: String,
    source: PathBuf,
    destination: PathBuf,
    runtime: Arc<dyn Runtime>,
}

impl CopyFilePlugin {
    pub fn new(
        runtime: Arc<dyn Runtime>,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: "copy-file".to_string(),
            source: source.into(),
            destination: destination.into(),
            runtime,
        }
    }

    /// Copy plugin for type declarations, named `copy-types`.
    pub fn types(
        runtime: Arc<dyn Runtime>,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self::new(runtime, source, destination).with_name("copy-types")
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[async_trait]
impl BuildPlugin for CopyFilePlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_end_hook(&self) -> bool {
        true
    }

    async fn on_end(&self) -> Result<()> {
        if let Some(parent) = self.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.runtime.create_dir_all(parent).await?;
        }
        self.runtime
            .copy_file(&self.source, &self.destination)
            .await?;

        tracing::debug!(
            from = %self.source.display(),
            to = %self.destination.display(),
            "copied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{MemoryRuntime, NativeRuntime};
    use crate::Error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_copy_is_byte_identical() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir_all(temp_dir.path().join("src")).unwrap();
        let decl = "export declare function transform(code: string): string;\n";
        std::fs::write(temp_dir.path().join("src/index.d.ts"), decl).unwrap();

        let runtime = Arc::new(NativeRuntime::new(temp_dir.path()));
        let plugin = CopyFilePlugin::types(runtime, "src/index.d.ts", "dist/index.d.ts");
        plugin.on_end().await.unwrap();

        let copied = std::fs::read(temp_dir.path().join("dist/index.d.ts")).unwrap();
        assert_eq!(copied, decl.as_bytes());
        assert_eq!(plugin.name(), "copy-types");
    }

    #[tokio::test]
    async fn test_copy_overwrites() {
        let runtime = Arc::new(MemoryRuntime::new("/project"));
        runtime.add_file("src/index.d.ts", "new");
        runtime.add_file("dist/index.d.ts", "stale declarations");

        CopyFilePlugin::new(runtime.clone(), "src/index.d.ts", "dist/index.d.ts")
            .on_end()
            .await
            .unwrap();

        assert_eq!(runtime.file_text("dist/index.d.ts").as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_missing_source_propagates() {
        let runtime = Arc::new(MemoryRuntime::new("/project"));
        let err = CopyFilePlugin::new(runtime, "src/index.d.ts", "dist/index.d.ts")
            .on_end()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
