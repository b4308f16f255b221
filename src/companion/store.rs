//! Persisted companion state. Replaced whole, never partially.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::state::CompanionState;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("state io: {0}")]
    Io(#[from] std::io::Error),
    #[error("state json: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub trait StateStore: Send + Sync {
    fn load(&self) -> StoreResult<Option<CompanionState>>;
    fn save(&self, state: &CompanionState) -> StoreResult<()>;
}

pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }
    pub fn path(&self) -> &Path { &self.path }
}

impl StateStore for FileStateStore {
    fn load(&self) -> StoreResult<Option<CompanionState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn save(&self, state: &CompanionState) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<CompanionState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self { Self::default() }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> StoreResult<Option<CompanionState>> {
        Ok(self.state.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn save(&self, state: &CompanionState) -> StoreResult<()> {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = Some(state.clone());
        Ok(())
    }
}
