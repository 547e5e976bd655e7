//! File system watcher with debouncing for watch mode.
//!
//! Watches the project directory recursively and forwards changes to relevant
//! files, ignoring `node_modules`, the build outputs and hidden paths.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::{Error, Result};

/// Recursive watcher feeding a channel of changed paths.
///
/// Only creations, modifications and removals are forwarded.
///
/// The underlying watcher stops when this value is dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl std::fmt::Debug for FileWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileWatcher").field("root", &self.root).finish()
    }
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// `ignore` holds root-relative prefixes (`node_modules`, `dist`) or
    /// extension patterns (`*.log`). Repeated events for the same path within
    /// `debounce` are dropped.
    pub fn new(
        root: PathBuf,
        ignore: Vec<String>,
        debounce: Duration,
    ) -> Result<(Self, mpsc::Receiver<PathBuf>)> {
        if !root.exists() {
            return Err(Error::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let mut last_event: Option<(PathBuf, Instant)> = None;
        let watch_root = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            if !Self::is_content_change(&event.kind) {
                return;
            }

            for path in &event.paths {
                if Self::should_ignore(path, &watch_root, &ignore) {
                    continue;
                }

                let now = Instant::now();
                if let Some((last_path, last_time)) = &last_event {
                    if last_path == path && now.duration_since(*last_time) < debounce {
                        continue;
                    }
                }
                last_event = Some((path.clone(), now));

                // Receiver gone means the watch loop ended.
                let _ = tx.blocking_send(path.clone());
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    fn is_content_change(kind: &EventKind) -> bool {
        matches!(
            kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        )
    }

    fn should_ignore(path: &Path, root: &Path, ignore: &[String]) -> bool {
        let Ok(rel_path) = path.strip_prefix(root) else {
            return true;
        };

        let path_str = rel_path.to_string_lossy();
        for pattern in ignore {
            if let Some(ext) = pattern.strip_prefix('*') {
                if path_str.ends_with(ext) {
                    return true;
                }
            } else if rel_path.starts_with(pattern) || path_str.contains(&format!("/{}/", pattern)) {
                return true;
            }
        }

        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }
}
