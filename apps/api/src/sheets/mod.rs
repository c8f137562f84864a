//! Spreadsheet source — job descriptions keyed by recruiter address.
//!
//! Reads go through the `SheetReader` trait so the Google Sheets client can be
//! swapped for a fake in tests. `SpreadsheetSource` owns the freshness cache
//! and the header-detection heuristic.

use async_trait::async_trait;
use thiserror::Error;

pub mod cache;
pub mod client;
pub mod columns;
pub mod handlers;
pub mod source;

/// Raw cell grid as returned by a range read. Rows may be ragged.
pub type Rows = Vec<Vec<String>>;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sheets API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid Sheets API URL: {0}")]
    InvalidUrl(String),
}

/// Range-addressed read of a rectangular cell region.
#[async_trait]
pub trait SheetReader: Send + Sync {
    async fn read_range(&self, range: &str) -> Result<Rows, UpstreamError>;
}

/// Builds an A1 range, quoting the sheet name when it is not a bare identifier.
pub fn a1_range(sheet_name: &str, cells: &str) -> String {
    if sheet_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        format!("{sheet_name}!{cells}")
    } else {
        format!("'{}'!{cells}", sheet_name.replace('\'', "''"))
    }
}
