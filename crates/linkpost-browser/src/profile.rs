use crate::Result;
use std::path::{Path, PathBuf};

/// Throwaway Chrome user-data directory, removed on drop.
///
/// Every automation run starts from a clean profile; the only state carried
/// between runs is the session file.
pub struct ScratchProfile {
    path: PathBuf,
}

impl ScratchProfile {
    pub fn new() -> Result<Self> {
        let path = tempfile::Builder::new()
            .prefix("linkpost-profile-")
            .tempdir()?
            .keep();
        tracing::debug!("Created scratch profile at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchProfile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::debug!(
                    "Could not remove scratch profile {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}
