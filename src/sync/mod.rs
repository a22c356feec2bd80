//! Best-effort remote persistence of flat tables.
//!
//! A [`RemoteStore`] saves and loads named CSV tables. [`BestEffortSync`]
//! wraps an optional store with bounded retries and turns every failure
//! into a [`SyncOutcome`] value, so a missing or broken remote never blocks
//! local work.
//!
//! # Example
//!
//! ```
//! use fattura::core::*;
//! use fattura::sync::{BestEffortSync, MemoryStore, RetryPolicy, SyncOutcome, CONTACTS_FILE};
//!
//! let sync = BestEffortSync::new(Box::new(MemoryStore::new()), RetryPolicy::default());
//! let mut registry = ContactRegistry::new();
//! registry.upsert("Acme Srl", ContactDetails::default()).unwrap();
//!
//! assert!(matches!(sync.save_contacts(&registry), SyncOutcome::Saved { .. }));
//! assert!(matches!(sync.load(CONTACTS_FILE), SyncOutcome::Loaded { .. }));
//! ```

mod config;
mod folder;
mod http;
mod memory;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::{
    ContactRegistry, DocumentStore, FatturaError, Session, Table, contacts_from_table,
    contacts_table, documents_table,
};
use crate::report::{Summary, summarize, summary_file_name, summary_table};

pub use config::{CREDENTIALS_ENV, Credentials, FOLDER_ENV, SyncConfig};
pub use folder::FolderStore;
pub use http::HttpStore;
pub use memory::MemoryStore;

pub const CONTACTS_FILE: &str = "contatti.csv";
pub const DOCUMENTS_FILE: &str = "documenti.csv";

/// Failure of a single remote operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SyncError {
    /// The named file does not exist remotely.
    #[error("remote file not found: {0}")]
    NotFound(String),

    /// Network, HTTP or filesystem failure; worth retrying.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote content is not a valid table.
    #[error("format error: {0}")]
    Format(String),
}

impl From<SyncError> for FatturaError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::NotFound(name) => FatturaError::NotFound(name),
            other => FatturaError::Sync(other.to_string()),
        }
    }
}

/// Named-table persistence.
pub trait RemoteStore: Send + Sync {
    /// Short description for logs.
    fn describe(&self) -> String;

    /// Create or replace `name`.
    fn save(&self, table: &Table, name: &str) -> Result<(), SyncError>;

    /// Read `name`; [`SyncError::NotFound`] when it does not exist.
    fn load(&self, name: &str) -> Result<Table, SyncError>;
}

/// Bounded retry with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Wait before retry `n` is `n * backoff_ms`.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff_ms: 0,
        }
    }

    fn delay(&self, retry: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(retry)))
    }
}

/// Result of a best-effort operation. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Saved { name: String },
    Loaded { name: String, table: Table },
    /// No remote configured, or configuration was unusable.
    Skipped { reason: String },
    NotFound { name: String },
    Failed { name: String, error: String },
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Saved { .. } | Self::Loaded { .. })
    }

    /// Italian status line for the UI.
    pub fn message(&self) -> String {
        match self {
            Self::Saved { name } => format!("{name} salvato sul remoto."),
            Self::Loaded { name, .. } => format!("{name} caricato dal remoto."),
            Self::Skipped { reason } => reason.clone(),
            Self::NotFound { name } => format!("{name} non trovato sul remoto."),
            Self::Failed { name, error } => format!("Errore di sincronizzazione per {name}: {error}"),
        }
    }
}

/// Optional remote store with retry; failures become [`SyncOutcome`]s.
pub struct BestEffortSync {
    store: Option<Box<dyn RemoteStore>>,
    retry: RetryPolicy,
    skip_reason: String,
}

impl BestEffortSync {
    pub fn new(store: Box<dyn RemoteStore>, retry: RetryPolicy) -> Self {
        Self {
            store: Some(store),
            retry,
            skip_reason: String::new(),
        }
    }

    /// No remote: every operation is [`SyncOutcome::Skipped`].
    pub fn disabled(reason: impl Into<String>) -> Self {
        Self {
            store: None,
            retry: RetryPolicy::none(),
            skip_reason: reason.into(),
        }
    }

    /// HTTP store from the process environment; disabled when nothing is
    /// configured or the configuration is malformed.
    pub fn from_env() -> Self {
        Self::from_config(SyncConfig::from_env())
    }

    pub fn from_config(config: Result<Option<SyncConfig>, FatturaError>) -> Self {
        match config {
            Ok(Some(cfg)) => {
                let retry = cfg.retry;
                match HttpStore::new(&cfg) {
                    Ok(store) => Self::new(Box::new(store), retry),
                    Err(e) => {
                        tracing::warn!(error = %e, "remote sync disabled");
                        Self::disabled(format!("Sincronizzazione non disponibile: {e}"))
                    }
                }
            }
            Ok(None) => {
                tracing::debug!("remote sync not configured");
                Self::disabled("Sincronizzazione remota non configurata.")
            }
            Err(e) => {
                tracing::warn!(error = %e, "remote sync disabled");
                Self::disabled(format!("Errore di configurazione della sincronizzazione: {e}"))
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    pub fn save(&self, table: &Table, name: &str) -> SyncOutcome {
        let Some(store) = &self.store else {
            return self.skipped();
        };
        match self.with_retry(name, || store.save(table, name)) {
            Ok(()) => {
                tracing::info!(name, store = %store.describe(), rows = table.rows.len(), "table saved");
                SyncOutcome::Saved {
                    name: name.to_string(),
                }
            }
            Err(e) => Self::failure(name, e),
        }
    }

    pub fn load(&self, name: &str) -> SyncOutcome {
        let Some(store) = &self.store else {
            return self.skipped();
        };
        match self.with_retry(name, || store.load(name)) {
            Ok(table) => {
                tracing::info!(name, store = %store.describe(), rows = table.rows.len(), "table loaded");
                SyncOutcome::Loaded {
                    name: name.to_string(),
                    table,
                }
            }
            Err(e) => Self::failure(name, e),
        }
    }

    pub fn save_contacts(&self, registry: &ContactRegistry) -> SyncOutcome {
        self.save(&contacts_table(registry), CONTACTS_FILE)
    }

    pub fn save_documents(&self, store: &DocumentStore) -> SyncOutcome {
        self.save(&documents_table(store), DOCUMENTS_FILE)
    }

    pub fn save_summary(&self, summary: &Summary) -> SyncOutcome {
        self.save(&summary_table(summary), &summary_file_name(summary.year))
    }

    /// Load the remote contacts table and upsert its rows into `registry`.
    /// Local contacts missing remotely are kept.
    pub fn restore_contacts(&self, registry: &mut ContactRegistry) -> SyncOutcome {
        let outcome = self.load(CONTACTS_FILE);
        if let SyncOutcome::Loaded { table, .. } = &outcome {
            match contacts_from_table(table, registry) {
                Ok(applied) => tracing::debug!(applied, "remote contacts merged"),
                Err(e) => return Self::failure(CONTACTS_FILE, SyncError::Format(e.to_string())),
            }
        }
        outcome
    }

    /// Push contacts, documents and the summary of `year`.
    pub fn push_session(&self, session: &Session, year: i32) -> Vec<SyncOutcome> {
        vec![
            self.save_contacts(session.contacts()),
            self.save_documents(session.documents()),
            self.save_summary(&summarize(session.documents().invoices(), year)),
        ]
    }

    fn with_retry<T>(
        &self,
        name: &str,
        mut op: impl FnMut() -> Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        let attempts = self.retry.attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(v) => return Ok(v),
                Err(SyncError::Transport(msg)) if attempt < attempts => {
                    tracing::debug!(name, attempt, error = %msg, "remote operation failed, retrying");
                    let delay = self.retry.delay(attempt);
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn skipped(&self) -> SyncOutcome {
        SyncOutcome::Skipped {
            reason: self.skip_reason.clone(),
        }
    }

    fn failure(name: &str, error: SyncError) -> SyncOutcome {
        match error {
            SyncError::NotFound(_) => {
                tracing::warn!(name, "remote file not found");
                SyncOutcome::NotFound {
                    name: name.to_string(),
                }
            }
            other => {
                tracing::warn!(name, error = %other, "remote sync failed");
                SyncOutcome::Failed {
                    name: name.to_string(),
                    error: other.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ContactDetails;

    fn quick() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff_ms: 0,
        }
    }

    #[test]
    fn disabled_skips_everything() {
        let sync = BestEffortSync::disabled("non configurato");
        assert!(!sync.is_enabled());
        let outcome = sync.save(&Table::new(&["A"]), "x.csv");
        assert_eq!(
            outcome,
            SyncOutcome::Skipped {
                reason: "non configurato".into()
            }
        );
        assert!(!outcome.is_success());
    }

    #[test]
    fn transient_failures_are_retried() {
        let store = MemoryStore::new();
        store.fail_next(2);
        let sync = BestEffortSync::new(Box::new(store.clone()), quick());
        assert!(sync.save(&Table::new(&["A"]), "x.csv").is_success());
        assert!(store.contains("x.csv"));
    }

    #[test]
    fn retries_are_bounded() {
        let store = MemoryStore::new();
        store.fail_next(3);
        let sync = BestEffortSync::new(Box::new(store.clone()), quick());
        let outcome = sync.save(&Table::new(&["A"]), "x.csv");
        assert!(matches!(outcome, SyncOutcome::Failed { .. }));
        assert!(!store.contains("x.csv"));
    }

    #[test]
    fn missing_file_is_not_found_without_retry() {
        let sync = BestEffortSync::new(Box::new(MemoryStore::new()), quick());
        assert_eq!(
            sync.load("nessuno.csv"),
            SyncOutcome::NotFound {
                name: "nessuno.csv".into()
            }
        );
    }

    #[test]
    fn contacts_restore_merges() {
        let store = MemoryStore::new();
        let sync = BestEffortSync::new(Box::new(store), quick());
        let mut remote = ContactRegistry::new();
        remote.upsert("Acme Srl", ContactDetails::default()).unwrap();
        assert!(sync.save_contacts(&remote).is_success());

        let mut local = ContactRegistry::new();
        local.upsert("Beta Spa", ContactDetails::default()).unwrap();
        assert!(sync.restore_contacts(&mut local).is_success());
        assert_eq!(local.len(), 2);
    }

    #[test]
    fn sync_error_maps_into_fattura_error() {
        let e: FatturaError = SyncError::NotFound("x.csv".into()).into();
        assert!(matches!(e, FatturaError::NotFound(_)));
        let e: FatturaError = SyncError::Transport("timeout".into()).into();
        assert!(matches!(e, FatturaError::Sync(_)));
    }
}
