//! Ephemeral per-session cache directory.
//!
//! Created once at startup, emptied whenever a new source is loaded and
//! removed when dropped (process exit). Raw and filtered frames live here.

use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::core::error::{PreviewError, PreviewResult};

#[derive(Debug)]
pub struct CacheDir {
    dir: TempDir,
}

impl CacheDir {
    /// Create a fresh directory under the system temp dir, or under `parent` if given.
    pub fn create(parent: Option<&Path>) -> PreviewResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("livegrade-");
        let dir = match parent {
            Some(parent) => builder
                .tempdir_in(parent)
                .map_err(|e| PreviewError::fs(parent, e))?,
            None => builder
                .tempdir()
                .map_err(|e| PreviewError::fs(std::env::temp_dir(), e))?,
        };
        info!("Cache directory: {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Remove every entry while keeping the directory itself.
    pub fn empty(&self) -> PreviewResult<()> {
        let root = self.dir.path();
        let entries = std::fs::read_dir(root).map_err(|e| PreviewError::fs(root, e))?;
        let mut removed = 0usize;
        for entry in entries {
            let entry = entry.map_err(|e| PreviewError::fs(root, e))?;
            let path = entry.path();
            let res = if path.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            match res {
                Ok(()) => removed += 1,
                // A concurrent writer may have renamed its temp file away already
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!("Failed to remove cache entry {}: {}", path.display(), e);
                    return Err(PreviewError::fs(&path, e));
                }
            }
        }
        debug!("Cache directory emptied ({} entries)", removed);
        Ok(())
    }
}
