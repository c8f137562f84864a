//! ContentReconciler — one row per contact, merged from the spreadsheet and
//! the draft store, with edits tracked per row until they are saved.

use crate::sheets::source::{FetchStatus, SpreadsheetSource};
use crate::store::{ContentSource, ContentStore};

pub mod handlers;
pub mod normalize;
pub mod rows;

use rows::{build_rows, Session};

/// Where the data behind a refresh came from.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub sheet_status: FetchStatus,
    pub content_source: ContentSource,
}

/// Reads both sources independently and folds the rebuilt rows into the
/// session. A degraded spreadsheet fetch still refreshes the drafts.
pub async fn refresh_session(
    session: &Session,
    sheets: &SpreadsheetSource,
    store: &ContentStore,
) -> RefreshReport {
    let outcome = sheets.fetch_all().await;
    let current = store.current().await;
    let fresh = build_rows(&outcome.descriptions, &current.content, store.baseline());

    session.lock().await.refresh(fresh);

    RefreshReport {
        sheet_status: outcome.status,
        content_source: current.source,
    }
}
