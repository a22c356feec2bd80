use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{RemoteStore, SyncError};
use crate::core::Table;

#[derive(Debug, Default)]
struct State {
    files: BTreeMap<String, String>,
    failures_left: u32,
}

/// In-process store for tests and offline use. Clones share the same files.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` operations fail with a transport error.
    pub fn fail_next(&self, n: u32) {
        if let Ok(mut state) = self.state.lock() {
            state.failures_left = n;
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock()
            .map(|s| s.files.contains_key(name))
            .unwrap_or(false)
    }

    /// Raw CSV of a stored file.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.lock().ok().and_then(|s| s.files.get(name).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, SyncError> {
        self.state
            .lock()
            .map_err(|_| SyncError::Transport("memory store lock poisoned".into()))
    }

    fn begin(&self) -> Result<MutexGuard<'_, State>, SyncError> {
        let mut state = self.lock()?;
        if state.failures_left > 0 {
            state.failures_left -= 1;
            return Err(SyncError::Transport("simulated failure".into()));
        }
        Ok(state)
    }
}

impl RemoteStore for MemoryStore {
    fn describe(&self) -> String {
        "memory".into()
    }

    fn save(&self, table: &Table, name: &str) -> Result<(), SyncError> {
        let mut state = self.begin()?;
        state.files.insert(name.to_string(), table.to_csv());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Table, SyncError> {
        let state = self.begin()?;
        let csv = state
            .files
            .get(name)
            .ok_or_else(|| SyncError::NotFound(name.to_string()))?;
        Table::from_csv(csv).map_err(|e| SyncError::Format(e.to_string()))
    }
}
