//! Scoped registry for temporary files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// Tracks temp files created during one execution and removes them on every
/// exit path; dropping the registry is the backstop for early returns.
#[derive(Debug, Default)]
pub struct TempRegistry {
    files: Vec<PathBuf>,
}

impl TempRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve a fresh WAV path under `dir` and register it for cleanup.
    pub fn create_wav_path(&mut self, dir: &Path) -> PathBuf {
        let path = dir.join(format!("align_{}.wav", Uuid::new_v4()));
        self.files.push(path.clone());
        path
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if no files are registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove all registered files now.
    pub fn cleanup(&mut self) {
        for path in self.files.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "removed temp file"),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove temp file"),
            }
        }
    }
}

impl Drop for TempRegistry {
    fn drop(&mut self) {
        self.cleanup();
    }
}
