use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;

use crate::foundation::error::{ReelError, ReelResult};

/// Destination for a finished recording.
pub trait FileSaver: Send {
    /// Persist `blob` under `file_name`.
    fn save(&mut self, file_name: &str, blob: &[u8]) -> ReelResult<()>;
}

/// Create the parent directory of `path` when missing.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Writes recordings into a directory.
#[derive(Clone, Debug)]
pub struct DirectorySaver {
    dir: PathBuf,
}

impl DirectorySaver {
    /// Save into `dir`, created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path a file name maps to.
    pub fn path_for(&self, file_name: &str) -> ReelResult<PathBuf> {
        let name = Path::new(file_name);
        let plain = name.file_name().is_some_and(|n| n == name.as_os_str());
        if !plain {
            return Err(ReelError::validation(format!(
                "export file name must be a plain file name, got '{file_name}'"
            )));
        }
        Ok(self.dir.join(name))
    }
}

impl FileSaver for DirectorySaver {
    fn save(&mut self, file_name: &str, blob: &[u8]) -> ReelResult<()> {
        let path = self.path_for(file_name)?;
        ensure_parent_dir(&path)?;
        std::fs::write(&path, blob)
            .with_context(|| format!("failed to write recording '{}'", path.display()))?;
        tracing::info!(path = %path.display(), bytes = blob.len(), "recording saved");
        Ok(())
    }
}

/// A saved blob kept by [`MemorySaver`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedFile {
    /// Name the blob was saved under.
    pub file_name: String,
    /// Blob contents.
    pub bytes: Vec<u8>,
}

/// Keeps saved recordings in memory behind a shared handle.
#[derive(Clone, Debug, Default)]
pub struct MemorySaver {
    saved: Arc<Mutex<Vec<SavedFile>>>,
}

impl MemorySaver {
    /// Shared view of every saved file.
    pub fn handle(&self) -> Arc<Mutex<Vec<SavedFile>>> {
        Arc::clone(&self.saved)
    }
}

impl FileSaver for MemorySaver {
    fn save(&mut self, file_name: &str, blob: &[u8]) -> ReelResult<()> {
        let mut saved = self
            .saved
            .lock()
            .map_err(|_| ReelError::recorder("memory saver lock poisoned"))?;
        saved.push(SavedFile {
            file_name: file_name.to_string(),
            bytes: blob.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/save.rs"]
mod tests;
