//! Google Sheets v4 `values.get` client.
//!
//! Credential minting (service-account JWT exchange) happens outside this
//! service; the client accepts a ready bearer token or an API key.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::sheets::{Rows, SheetReader, UpstreamError};

#[derive(Debug, Clone)]
pub enum SheetsAuth {
    None,
    BearerToken(String),
    ApiKey(String),
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GoogleSheetsClient {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    auth: SheetsAuth,
}

impl GoogleSheetsClient {
    pub fn new(
        api_base: String,
        spreadsheet_id: String,
        auth: SheetsAuth,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_base,
            spreadsheet_id,
            auth,
        })
    }

    fn values_url(&self, range: &str) -> Result<Url, UpstreamError> {
        let mut url =
            Url::parse(&self.api_base).map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidUrl(self.api_base.clone()))?
            .pop_if_empty()
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", range]);
        if let SheetsAuth::ApiKey(key) = &self.auth {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }
}

#[async_trait]
impl SheetReader for GoogleSheetsClient {
    async fn read_range(&self, range: &str) -> Result<Rows, UpstreamError> {
        let url = self.values_url(range)?;
        let mut request = self.client.get(url);
        if let SheetsAuth::BearerToken(token) = &self.auth {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GoogleError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(UpstreamError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let range_values: ValueRange = response.json().await?;
        debug!("Read {} rows from range {range}", range_values.values.len());

        Ok(range_values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

/// Formatted values arrive as strings; anything else is rendered as JSON text.
fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, auth: SheetsAuth) -> GoogleSheetsClient {
        GoogleSheetsClient::new(
            base.to_string(),
            "sheet-123".to_string(),
            auth,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_values_url_encodes_range() {
        let c = client("https://sheets.googleapis.com", SheetsAuth::None);
        let url = c.values_url("'Q3 Leads'!A1:Z1").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/sheet-123/values/'Q3%20Leads'!A1:Z1"
        );
    }

    #[test]
    fn test_values_url_trailing_slash_and_api_key() {
        let c = client(
            "https://sheets.example.test/",
            SheetsAuth::ApiKey("k1".to_string()),
        );
        let url = c.values_url("Sheet1!A2:Z").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.example.test/v4/spreadsheets/sheet-123/values/Sheet1!A2:Z?key=k1"
        );
    }

    #[test]
    fn test_values_url_rejects_garbage_base() {
        let c = client("not a url", SheetsAuth::None);
        assert!(matches!(
            c.values_url("Sheet1!A1:Z1"),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(Value::String("a@b.com".into())), "a@b.com");
        assert_eq!(cell_to_string(serde_json::json!(42)), "42");
        assert_eq!(cell_to_string(Value::Null), "");
    }
}
