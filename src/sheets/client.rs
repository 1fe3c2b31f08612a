use std::time::Duration;

use reqwest::Client;
use serde_json::json;

use super::types::{BatchUpdateValuesRequest, PendingWrite, ValueRange};
use crate::error::RemoteError;

const API_URL: &str = "https://sheets.googleapis.com";

/// Seam over the persistence sink: an addressable 2-D grid with a header
/// row. Everything above the client (schema provisioner, write buffer,
/// scheduler, readers) talks to this trait so it can run against a mock.
pub trait SheetStore {
    /// Rows of an A1 range. Empty ranges yield an empty vec.
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>, RemoteError>;
    /// Overwrite an A1 range with the given rows.
    async fn update_range(&self, range: &str, values: Vec<Vec<String>>)
    -> Result<(), RemoteError>;
    /// Apply a list of cell writes in one call.
    async fn batch_update(&self, writes: &[PendingWrite]) -> Result<(), RemoteError>;
    /// Append a new tab with the given title.
    async fn add_sheet(&self, title: &str) -> Result<(), RemoteError>;
}

pub struct SheetsClient {
    token: String,
    sheet_id: String,
    client: Client,
    base_url: String,
}

impl SheetsClient {
    pub fn new(token: String, sheet_id: String) -> Self {
        Self::with_base_url(token, sheet_id, API_URL.to_string())
    }

    /// Create a client pointing at a custom base URL (useful for testing).
    pub fn with_base_url(token: String, sheet_id: String, base_url: String) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");
        Self {
            token,
            sheet_id,
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn values_url(&self, suffix: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{}/values{}",
            self.base_url, self.sheet_id, suffix
        )
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        Err(RemoteError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

impl SheetStore for SheetsClient {
    async fn get_range(&self, range: &str) -> Result<Vec<Vec<String>>, RemoteError> {
        let response = self
            .client
            .get(self.values_url(&format!("/{range}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body: ValueRange = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        Ok(body.values)
    }

    async fn update_range(
        &self,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), RemoteError> {
        let body = ValueRange {
            range: Some(range.to_string()),
            values,
        };
        let response = self
            .client
            .put(self.values_url(&format!("/{range}")))
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn batch_update(&self, writes: &[PendingWrite]) -> Result<(), RemoteError> {
        let body = BatchUpdateValuesRequest {
            value_input_option: "RAW".into(),
            data: writes.iter().map(ValueRange::from).collect(),
        };
        let response = self
            .client
            .post(self.values_url(":batchUpdate"))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn add_sheet(&self, title: &str) -> Result<(), RemoteError> {
        let body = json!({
            "requests": [{ "addSheet": { "properties": { "title": title } } }]
        });
        let response = self
            .client
            .post(format!(
                "{}/v4/spreadsheets/{}:batchUpdate",
                self.base_url, self.sheet_id
            ))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}
