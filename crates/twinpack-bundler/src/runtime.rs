//! Filesystem runtime abstraction
//!
//! Plugins never touch `std::fs` directly. They receive an `Arc<dyn Runtime>`
//! at construction and go through it for every read, write and copy, which
//! lets tests swap in [`MemoryRuntime`] and keeps relative paths resolved
//! against one project root.

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Other runtime error
    #[error("Runtime error: {0}")]
    Other(String),
}

/// Filesystem primitives consumed by the pipeline.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file as raw bytes
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Write a file, replacing any existing content
    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()>;

    /// Copy `from` to `to`, replacing any existing destination
    async fn copy_file(&self, from: &Path, to: &Path) -> RuntimeResult<()>;

    /// Create a directory and all missing parents
    async fn create_dir_all(&self, path: &Path) -> RuntimeResult<()>;

    /// Check if a path exists
    fn exists(&self, path: &Path) -> bool;

    /// Root that relative paths are resolved against
    fn cwd(&self) -> &Path;

    /// Read a file as UTF-8 text
    async fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes)
            .map_err(|e| RuntimeError::Io(format!("{} is not valid UTF-8: {}", path.display(), e)))
    }

    /// Resolve a path relative to [`Runtime::cwd`]
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf().clean()
        } else {
            self.cwd().join(path).clean()
        }
    }
}

fn io_error(action: &str, path: &Path, err: std::io::Error) -> RuntimeError {
    if err.kind() == std::io::ErrorKind::NotFound {
        RuntimeError::FileNotFound(path.to_path_buf())
    } else {
        RuntimeError::Io(format!("Failed to {} {}: {}", action, path.display(), err))
    }
}

/// Runtime backed by the real filesystem.
#[derive(Debug, Clone)]
pub struct NativeRuntime {
    cwd: PathBuf,
}

impl NativeRuntime {
    /// Create a runtime rooted at `cwd`
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self { cwd: cwd.into() }
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let full_path = self.resolve_path(path);
        tokio::fs::read(&full_path)
            .await
            .map_err(|e| io_error("read", &full_path, e))
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let full_path = self.resolve_path(path);
        tokio::fs::write(&full_path, content)
            .await
            .map_err(|e| io_error("write", &full_path, e))
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> RuntimeResult<()> {
        let from = self.resolve_path(from);
        let to = self.resolve_path(to);
        tokio::fs::copy(&from, &to)
            .await
            .map(|_| ())
            .map_err(|e| io_error("copy", &from, e))
    }

    async fn create_dir_all(&self, path: &Path) -> RuntimeResult<()> {
        let full_path = self.resolve_path(path);
        tokio::fs::create_dir_all(&full_path)
            .await
            .map_err(|e| io_error("create directory", &full_path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve_path(path).exists()
    }

    fn cwd(&self) -> &Path {
        &self.cwd
    }
}

/// In-memory runtime.
///
/// Files live in a shared map keyed by normalized absolute path. Clones share
/// the same map.
#[derive(Debug, Clone)]
pub struct MemoryRuntime {
    files: Arc<RwLock<FxHashMap<PathBuf, Vec<u8>>>>,
    cwd: PathBuf,
}

impl MemoryRuntime {
    /// Create an empty runtime rooted at `cwd`
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            files: Arc::new(RwLock::new(FxHashMap::default())),
            cwd: cwd.into(),
        }
    }

    /// Add or replace a file
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let normalized = self.resolve_path(path.as_ref());
        self.files.write().insert(normalized, content.into());
    }

    /// Current content of a file as text, if present
    pub fn file_text(&self, path: impl AsRef<Path>) -> Option<String> {
        let normalized = self.resolve_path(path.as_ref());
        self.files
            .read()
            .get(&normalized)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }
}

#[async_trait]
impl Runtime for MemoryRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let normalized = self.resolve_path(path);
        self.files
            .read()
            .get(&normalized)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(normalized))
    }

    async fn write_file(&self, path: &Path, content: &[u8]) -> RuntimeResult<()> {
        let normalized = self.resolve_path(path);
        self.files.write().insert(normalized, content.to_vec());
        Ok(())
    }

    async fn copy_file(&self, from: &Path, to: &Path) -> RuntimeResult<()> {
        let from = self.resolve_path(from);
        let to = self.resolve_path(to);
        let mut files = self.files.write();
        let content = files
            .get(&from)
            .cloned()
            .ok_or(RuntimeError::FileNotFound(from))?;
        files.insert(to, content);
        Ok(())
    }

    async fn create_dir_all(&self, _path: &Path) -> RuntimeResult<()> {
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let normalized = self.resolve_path(path);
        self.files.read().contains_key(&normalized)
    }

    fn cwd(&self) -> &Path {
        &self.cwd
    }
}
