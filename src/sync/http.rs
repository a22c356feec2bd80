use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;

use super::{RemoteStore, SyncConfig, SyncError};
use crate::core::{FatturaError, Table};

/// CSV objects on a bearer-authenticated HTTP store:
/// `PUT`/`GET {endpoint}/{folder_id}/{name}`.
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpStore {
    pub fn new(config: &SyncConfig) -> Result<Self, FatturaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FatturaError::Config(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: object_base(&config.credentials.endpoint, &config.folder_id),
            token: config.credentials.token.clone(),
        })
    }

    fn url(&self, name: &str) -> String {
        format!("{}/{name}", self.base_url)
    }
}

fn object_base(endpoint: &str, folder_id: &str) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        folder_id.trim_matches('/')
    )
}

impl RemoteStore for HttpStore {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn save(&self, table: &Table, name: &str) -> Result<(), SyncError> {
        let resp = self
            .client
            .put(self.url(name))
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "text/csv; charset=utf-8")
            .body(table.to_csv())
            .send()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SyncError::Transport(format!("HTTP {status} saving {name}")))
        }
    }

    fn load(&self, name: &str) -> Result<Table, SyncError> {
        let resp = self
            .client
            .get(self.url(name))
            .bearer_auth(&self.token)
            .send()
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SyncError::NotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(SyncError::Transport(format!("HTTP {status} loading {name}")));
        }
        let body = resp
            .text()
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Table::from_csv(&body).map_err(|e| SyncError::Format(e.to_string()))
    }
}
