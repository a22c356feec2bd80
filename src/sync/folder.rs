use std::io::ErrorKind;
use std::path::PathBuf;

use super::{RemoteStore, SyncError};
use crate::core::Table;

/// Tables stored as CSV files in a directory, e.g. one kept in sync by a
/// desktop client.
#[derive(Debug, Clone)]
pub struct FolderStore {
    root: PathBuf,
}

impl FolderStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl RemoteStore for FolderStore {
    fn describe(&self) -> String {
        format!("folder {}", self.root.display())
    }

    fn save(&self, table: &Table, name: &str) -> Result<(), SyncError> {
        std::fs::create_dir_all(&self.root).map_err(|e| SyncError::Transport(e.to_string()))?;
        let path = self.root.join(name);
        // Write next to the target and rename, so readers never see half a file.
        let tmp = self.root.join(format!(".{name}.tmp"));
        std::fs::write(&tmp, table.to_csv()).map_err(|e| SyncError::Transport(e.to_string()))?;
        std::fs::rename(&tmp, &path).map_err(|e| SyncError::Transport(e.to_string()))
    }

    fn load(&self, name: &str) -> Result<Table, SyncError> {
        let text = match std::fs::read_to_string(self.root.join(name)) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncError::NotFound(name.to_string()));
            }
            Err(e) => return Err(SyncError::Transport(e.to_string())),
        };
        Table::from_csv(&text).map_err(|e| SyncError::Format(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = std::env::temp_dir().join(format!("fattura-folder-{}", uuid::Uuid::new_v4()));
        let store = FolderStore::new(&dir);
        let mut table = Table::new(&["Numero", "Importo"]);
        table.push_row(vec!["FT2025001".into(), "305.00".into()]);

        store.save(&table, "documenti.csv").unwrap();
        assert_eq!(store.load("documenti.csv").unwrap(), table);
        assert_eq!(
            store.load("contatti.csv"),
            Err(SyncError::NotFound("contatti.csv".into()))
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
