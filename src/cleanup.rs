//! Best-effort removal of transient files.
//!
//! [`ScopedCleanup`] is a drop guard: whatever it tracks is deleted when it
//! goes out of scope, on success, per-task failure or a fatal abort alike.
//! Deletion never panics or returns an error; a path that cannot be removed
//! is reported with `tracing::warn!` and left behind.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Delete a file or directory tree. Returns `true` when the path is gone
/// afterwards (including when it never existed).
pub fn remove_path(path: &Path) -> bool {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == ErrorKind::NotFound => return true,
        Err(e) => {
            tracing::warn!("Cannot inspect {:?} for cleanup: {}", path, e);
            return false;
        }
    };

    let result = if metadata.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            tracing::debug!("Removed {:?}", path);
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => true,
        Err(e) => {
            tracing::warn!("Failed to remove {:?}: {}", path, e);
            false
        }
    }
}

/// Deletes every tracked path when dropped.
#[derive(Debug)]
pub struct ScopedCleanup {
    label: &'static str,
    paths: Vec<PathBuf>,
}

impl ScopedCleanup {
    /// Empty guard; `label` names it in log messages.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            paths: Vec::new(),
        }
    }

    /// Guard tracking a single path.
    pub fn with_path(label: &'static str, path: impl Into<PathBuf>) -> Self {
        let mut guard = Self::new(label);
        guard.track(path);
        guard
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) {
        self.paths.push(path.into());
    }

    /// Stop tracking `path`; it survives the guard.
    pub fn release(&mut self, path: &Path) {
        self.paths.retain(|p| p != path);
    }

    /// Stop tracking everything.
    pub fn release_all(&mut self) {
        self.paths.clear();
    }

    pub fn tracked(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Delete everything tracked right now instead of at drop.
    pub fn run_now(&mut self) {
        let paths = std::mem::take(&mut self.paths);
        if !paths.is_empty() {
            tracing::debug!("Cleaning up {} path(s) for {}", paths.len(), self.label);
        }
        for path in paths {
            remove_path(&path);
        }
    }
}

impl Drop for ScopedCleanup {
    fn drop(&mut self) {
        self.run_now();
    }
}
