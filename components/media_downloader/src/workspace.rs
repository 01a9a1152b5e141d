//! Request-scoped namespace inside the shared temporary root
//!
//! Concurrent requests for the same title never see each other's files:
//! the fetcher writes into `<workspace>/fetch/` and the final artifact lives
//! at `<workspace>/<title>.<ext>`. Dropping a `Workspace` removes it.

use crate::error::PipelineError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const FETCH_DIR: &str = "fetch";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    id: String,
}

impl Workspace {
    pub fn create(temp_root: &Path) -> Result<Self, PipelineError> {
        let dir = tempfile::Builder::new()
            .prefix("req-")
            .tempdir_in(temp_root)
            .map_err(|e| PipelineError::io("creating request workspace", e))?;

        std::fs::create_dir(dir.path().join(FETCH_DIR))
            .map_err(|e| PipelineError::io("creating fetch directory", e))?;

        let id = dir
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self { dir, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Directory the fetcher writes raw output into
    pub fn fetch_dir(&self) -> PathBuf {
        self.dir.path().join(FETCH_DIR)
    }

    pub fn final_path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    /// Best-effort removal of everything the request produced
    pub fn discard(self) {
        let path = self.dir.path().to_path_buf();
        match self.dir.close() {
            Ok(()) => tracing::debug!("Removed workspace {}", path.display()),
            Err(e) => tracing::warn!("Failed to remove workspace {}: {}", path.display(), e),
        }
    }
}
