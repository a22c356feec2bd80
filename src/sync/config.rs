use std::fmt;

use serde::{Deserialize, Serialize};

use super::RetryPolicy;
use crate::core::FatturaError;

/// Remote folder (or bucket prefix) the tables live in.
pub const FOLDER_ENV: &str = "FATTURA_SYNC_FOLDER_ID";
/// JSON object `{ "endpoint": "...", "token": "..." }`.
pub const CREDENTIALS_ENV: &str = "FATTURA_SYNC_CREDENTIALS_JSON";

/// Credentials as stored in [`CREDENTIALS_ENV`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub endpoint: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("endpoint", &self.endpoint)
            .field("token", &"***")
            .finish()
    }
}

/// Remote sync settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub folder_id: String,
    pub credentials: Credentials,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl SyncConfig {
    pub fn new(folder_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            folder_id: folder_id.into(),
            credentials,
            timeout_secs: 20,
            retry: RetryPolicy::default(),
        }
    }

    /// Read the configuration from the process environment.
    ///
    /// `Ok(None)` when either variable is unset or blank; a configuration
    /// error when the credentials are not valid JSON or lack a field.
    pub fn from_env() -> Result<Option<Self>, FatturaError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SyncConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Option<Self>, FatturaError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let (Some(folder_id), Some(raw)) = (get(FOLDER_ENV), get(CREDENTIALS_ENV)) else {
            return Ok(None);
        };

        let credentials: Credentials = serde_json::from_str(&raw)
            .map_err(|e| FatturaError::Config(format!("{CREDENTIALS_ENV}: {e}")))?;
        if credentials.endpoint.trim().is_empty() || credentials.token.trim().is_empty() {
            return Err(FatturaError::Config(format!(
                "{CREDENTIALS_ENV}: endpoint and token must not be empty"
            )));
        }
        if !credentials.endpoint.starts_with("http://") && !credentials.endpoint.starts_with("https://") {
            return Err(FatturaError::Config(format!(
                "{CREDENTIALS_ENV}: endpoint '{}' is not an http(s) URL",
                credentials.endpoint
            )));
        }

        Ok(Some(Self::new(folder_id.trim(), credentials)))
    }
}
