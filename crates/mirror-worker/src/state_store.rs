//! Cross-session state file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use mirror_engine::PersistentState;
use tracing::info;

use crate::error::WorkerResult;

/// JSON file holding the engine's persistent state.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved state. A missing file is a first run, not an error.
    pub async fn load(&self) -> WorkerResult<Option<PersistentState>> {
        let json = match tokio::fs::read_to_string(&self.path).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No saved state, starting fresh");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Some(PersistentState::from_json(&json)?))
    }

    /// Write state through a temporary sibling file and rename it into place.
    pub async fn save(&self, state: &PersistentState) -> WorkerResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, state.to_json()?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        info!(
            path = %self.path.display(),
            history_samples = state.history.len(),
            reports = state.report_memory.len(),
            "Saved session state"
        );
        Ok(())
    }
}
