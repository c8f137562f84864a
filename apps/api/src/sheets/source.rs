//! SpreadsheetSource — cached address → job description lookups.
//!
//! Flow: fresh cache hit → return; otherwise header probe → data read →
//! row mapping → wholesale cache replace. Fetch failures never clear the
//! cache; they come back as `FetchStatus::Degraded` with the last known data.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::sheets::cache::{Clock, DescriptionCache};
use crate::sheets::columns::{map_rows, ColumnLayout, DescriptionMap};
use crate::sheets::{a1_range, SheetReader, UpstreamError};

const HEADER_CELLS: &str = "A1:Z1";
const DATA_CELLS: &str = "A2:Z";

/// How a `fetch_all` result was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchStatus {
    /// Fetched from the sheet just now and non-empty.
    Fresh,
    /// Served from the cache inside the freshness window.
    Cached,
    /// Fetched successfully but the sheet holds no usable rows.
    Empty,
    /// The fetch failed; data is the last known mapping, possibly stale or empty.
    Degraded { error: String },
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Fresh => "fresh",
            FetchStatus::Cached => "cached",
            FetchStatus::Empty => "empty",
            FetchStatus::Degraded { .. } => "degraded",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub descriptions: DescriptionMap,
    pub status: FetchStatus,
}

pub struct SpreadsheetSource {
    reader: Arc<dyn SheetReader>,
    sheet_name: String,
    cache: DescriptionCache,
    /// Held while a remote refresh is in flight so concurrent callers share it.
    refresh: Mutex<()>,
}

impl SpreadsheetSource {
    pub fn new(
        reader: Arc<dyn SheetReader>,
        sheet_name: String,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            reader,
            sheet_name,
            cache: DescriptionCache::new(ttl, clock),
            refresh: Mutex::new(()),
        }
    }

    pub async fn fetch_all(&self) -> FetchOutcome {
        if let Some(descriptions) = self.cache.fresh() {
            return FetchOutcome {
                descriptions,
                status: FetchStatus::Cached,
            };
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while this one waited.
        if let Some(descriptions) = self.cache.fresh() {
            return FetchOutcome {
                descriptions,
                status: FetchStatus::Cached,
            };
        }

        match self.fetch_remote().await {
            Ok(descriptions) => {
                self.cache.replace(descriptions.clone());
                let status = if descriptions.is_empty() {
                    FetchStatus::Empty
                } else {
                    FetchStatus::Fresh
                };
                FetchOutcome {
                    descriptions,
                    status,
                }
            }
            Err(e) => {
                warn!("Error fetching job descriptions: {e}");
                FetchOutcome {
                    descriptions: self.cache.last_known().unwrap_or_default(),
                    status: FetchStatus::Degraded {
                        error: e.to_string(),
                    },
                }
            }
        }
    }

    /// Description for one address, or an empty string when unknown.
    pub async fn description_for(&self, address: &str) -> String {
        self.fetch_all()
            .await
            .descriptions
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    async fn fetch_remote(&self) -> Result<DescriptionMap, UpstreamError> {
        let header_rows = self
            .reader
            .read_range(&a1_range(&self.sheet_name, HEADER_CELLS))
            .await?;
        let layout = ColumnLayout::detect(header_rows.first().map(Vec::as_slice).unwrap_or(&[]));

        let rows = self
            .reader
            .read_range(&a1_range(&self.sheet_name, DATA_CELLS))
            .await?;
        if rows.is_empty() {
            info!("No data rows found in sheet {}", self.sheet_name);
            return Ok(DescriptionMap::new());
        }

        info!(
            "Using email column: {}, job description column: {}",
            layout.address + 1,
            layout.description + 1
        );
        let descriptions = map_rows(&rows, layout);
        info!(
            "Mapped {} job descriptions from {} rows",
            descriptions.len(),
            rows.len()
        );
        Ok(descriptions)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeSheetReader;
    use super::*;
    use crate::sheets::cache::ManualClock;

    const HEADERS: &[&str] = &["Name", "Email", "Company", "Job Description"];

    fn source(reader: Arc<FakeSheetReader>, clock: Arc<ManualClock>) -> SpreadsheetSource {
        SpreadsheetSource::new(reader, "Sheet1".to_string(), Duration::from_secs(60), clock)
    }

    #[tokio::test]
    async fn test_fetch_maps_rows_and_reports_fresh() {
        let reader = Arc::new(FakeSheetReader::new(
            HEADERS,
            &[&["Jane", "jane@co.com", "Acme", "Build widgets"]],
        ));
        let src = source(reader.clone(), Arc::new(ManualClock::new()));

        let outcome = src.fetch_all().await;
        assert_eq!(outcome.status, FetchStatus::Fresh);
        assert_eq!(outcome.descriptions["jane@co.com"], "Build widgets");
        assert_eq!(reader.call_count(), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_within_window_skips_remote() {
        let reader = Arc::new(FakeSheetReader::new(
            HEADERS,
            &[&["Jane", "jane@co.com", "Acme", "Build widgets"]],
        ));
        let clock = Arc::new(ManualClock::new());
        let src = source(reader.clone(), clock.clone());

        let first = src.fetch_all().await;
        reader.set_data(&[&["Jane", "jane@co.com", "Acme", "Changed"]]);
        clock.advance(Duration::from_secs(30));
        let second = src.fetch_all().await;

        assert_eq!(second.status, FetchStatus::Cached);
        assert_eq!(first.descriptions, second.descriptions);
        assert_eq!(reader.call_count(), 2);

        clock.advance(Duration::from_secs(30));
        let third = src.fetch_all().await;
        assert_eq!(third.status, FetchStatus::Fresh);
        assert_eq!(third.descriptions["jane@co.com"], "Changed");
        assert_eq!(reader.call_count(), 4);
    }

    #[tokio::test]
    async fn test_empty_result_is_refetched_every_time() {
        let reader = Arc::new(FakeSheetReader::new(HEADERS, &[]));
        let src = source(reader.clone(), Arc::new(ManualClock::new()));

        assert_eq!(src.fetch_all().await.status, FetchStatus::Empty);
        assert_eq!(src.fetch_all().await.status, FetchStatus::Empty);
        assert_eq!(reader.call_count(), 4);
    }

    #[tokio::test]
    async fn test_failure_keeps_prior_cache_and_reports_degraded() {
        let reader = Arc::new(FakeSheetReader::new(
            HEADERS,
            &[&["Jane", "jane@co.com", "Acme", "Build widgets"]],
        ));
        let clock = Arc::new(ManualClock::new());
        let src = source(reader.clone(), clock.clone());
        src.fetch_all().await;

        reader.set_failing(true);
        clock.advance(Duration::from_secs(120));
        let outcome = src.fetch_all().await;

        assert!(matches!(outcome.status, FetchStatus::Degraded { .. }));
        assert_eq!(outcome.descriptions["jane@co.com"], "Build widgets");

        reader.set_failing(false);
        assert_eq!(src.fetch_all().await.status, FetchStatus::Fresh);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_degraded_and_empty() {
        let reader = Arc::new(FakeSheetReader::new(HEADERS, &[]));
        reader.set_failing(true);
        let src = source(reader, Arc::new(ManualClock::new()));

        let outcome = src.fetch_all().await;
        assert_eq!(outcome.status.as_str(), "degraded");
        assert!(outcome.descriptions.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let reader = Arc::new(FakeSheetReader::new(
            HEADERS,
            &[&["Jane", "jane@co.com", "Acme", "Build widgets"]],
        ));
        let src = source(reader.clone(), Arc::new(ManualClock::new()));
        src.fetch_all().await;
        src.invalidate();
        assert_eq!(src.fetch_all().await.status, FetchStatus::Fresh);
        assert_eq!(reader.call_count(), 4);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_share_one_refresh() {
        let reader = Arc::new(FakeSheetReader::new(
            HEADERS,
            &[&["Jane", "jane@co.com", "Acme", "Build widgets"]],
        ));
        reader.set_delay(Duration::from_millis(100));
        let src = source(reader.clone(), Arc::new(ManualClock::new()));

        let (a, b, c) = tokio::join!(src.fetch_all(), src.fetch_all(), src.fetch_all());

        assert_eq!(reader.call_count(), 2);
        let mut statuses = vec![a.status, b.status, c.status];
        statuses.sort_by_key(|s| s.as_str());
        assert_eq!(
            statuses,
            vec![FetchStatus::Cached, FetchStatus::Cached, FetchStatus::Fresh]
        );
        assert_eq!(a.descriptions, c.descriptions);
    }

    #[tokio::test]
    async fn test_description_for_unknown_is_empty() {
        let reader = Arc::new(FakeSheetReader::new(
            HEADERS,
            &[&["Jane", "jane@co.com", "Acme", "Build widgets"]],
        ));
        let src = source(reader, Arc::new(ManualClock::new()));
        assert_eq!(src.description_for("jane@co.com").await, "Build widgets");
        assert_eq!(src.description_for("nobody@co.com").await, "");
    }
}
