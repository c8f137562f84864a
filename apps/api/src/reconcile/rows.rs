//! Unified contact rows and their editing state machine.
//!
//! Rows are the union of spreadsheet addresses and draft addresses. Per row:
//! clean → dirty (edit/undo/regenerate) → saved (successful save) → dirty ...
//! A failed regeneration or save leaves the row exactly as it was.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};

use crate::models::contact::ContactRecord;
use crate::reconcile::normalize::normalize_draft;
use crate::regeneration::{regenerate_draft, GenerationError, Regenerator};
use crate::sheets::columns::DescriptionMap;
use crate::store::{ContentMap, ContentStore, StoreError};

#[derive(Debug, Error)]
pub enum RowError {
    #[error("no contact row for {0}")]
    UnknownAddress(String),

    #[error("a regeneration for {0} is already in progress")]
    AlreadyRegenerating(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("regeneration task for {0} did not complete")]
    Interrupted(String),
}

/// Builds one row per address seen in either the spreadsheet or the drafts.
///
/// A missing description becomes `""`. A missing draft falls back to the
/// baseline draft for that address, then to the first available draft as a
/// template, then to `""`.
pub fn build_rows(
    descriptions: &DescriptionMap,
    drafts: &ContentMap,
    baseline: &ContentMap,
) -> Vec<ContactRecord> {
    let template = drafts
        .values()
        .next()
        .or_else(|| baseline.values().next())
        .map(String::as_str)
        .unwrap_or_default();

    let addresses: BTreeSet<&String> = descriptions
        .keys()
        .chain(drafts.keys())
        .chain(baseline.keys())
        .collect();

    addresses
        .into_iter()
        .map(|address| {
            let draft = drafts
                .get(address)
                .or_else(|| baseline.get(address))
                .map(String::as_str)
                .unwrap_or(template);
            let original = baseline.get(address).map(String::as_str).unwrap_or(draft);

            ContactRecord::new(
                address.clone(),
                descriptions.get(address).cloned().unwrap_or_default(),
                normalize_draft(draft),
                normalize_draft(original),
            )
        })
        .collect()
}

/// In-memory editing session over the unified rows, ordered by address.
#[derive(Debug, Default)]
pub struct RowSet {
    rows: BTreeMap<String, ContactRecord>,
}

impl RowSet {
    pub fn new(rows: Vec<ContactRecord>) -> Self {
        Self {
            rows: rows.into_iter().map(|r| (r.address.clone(), r)).collect(),
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &ContactRecord> {
        self.rows.values()
    }

    pub fn get(&self, address: &str) -> Option<&ContactRecord> {
        self.rows.get(address)
    }

    fn row_mut(&mut self, address: &str) -> Result<&mut ContactRecord, RowError> {
        self.rows
            .get_mut(address)
            .ok_or_else(|| RowError::UnknownAddress(address.to_string()))
    }

    /// Folds freshly built rows into the session. Descriptions always update;
    /// drafts of rows with unsaved edits or a pending regeneration are kept.
    /// Rows are never removed.
    pub fn refresh(&mut self, fresh: Vec<ContactRecord>) {
        for incoming in fresh {
            match self.rows.get_mut(&incoming.address) {
                Some(existing) if existing.dirty || existing.regenerating => {
                    existing.job_description = incoming.job_description;
                }
                // Incoming drafts are normalized; the row may hold the raw text
                // that was saved, so compare in normalized form.
                Some(existing)
                    if normalize_draft(&existing.draft_content) == incoming.draft_content =>
                {
                    existing.job_description = incoming.job_description;
                    existing.original_content = incoming.original_content;
                }
                Some(existing) => *existing = incoming,
                None => {
                    self.rows.insert(incoming.address.clone(), incoming);
                }
            }
        }
    }

    pub fn edit(&mut self, address: &str, content: String) -> Result<&ContactRecord, RowError> {
        let row = self.row_mut(address)?;
        row.draft_content = content;
        row.dirty = true;
        row.saved = false;
        Ok(&*row)
    }

    /// Restores the baseline draft. The restored draft still has to be saved.
    pub fn undo(&mut self, address: &str) -> Result<&ContactRecord, RowError> {
        let row = self.row_mut(address)?;
        row.draft_content = row.original_content.clone();
        row.dirty = true;
        row.saved = false;
        Ok(&*row)
    }

    /// Marks the row saved if its draft is still what was persisted.
    /// Returns whether the row was marked.
    pub fn mark_saved(&mut self, address: &str, persisted: &str) -> Result<bool, RowError> {
        let row = self.row_mut(address)?;
        if row.draft_content != persisted {
            debug!("Draft for {address} changed while saving; leaving it dirty");
            return Ok(false);
        }
        row.saved = true;
        row.dirty = false;
        Ok(true)
    }

    /// Flags the row as regenerating and returns its job description.
    pub fn begin_regenerate(&mut self, address: &str) -> Result<String, RowError> {
        let row = self.row_mut(address)?;
        if row.regenerating {
            return Err(RowError::AlreadyRegenerating(address.to_string()));
        }
        row.regenerating = true;
        Ok(row.job_description.clone())
    }

    /// Applies a regeneration result. Success replaces the draft and leaves it
    /// unsaved; failure only clears the regenerating flag.
    pub fn finish_regenerate(
        &mut self,
        address: &str,
        result: Result<String, GenerationError>,
    ) -> Result<&ContactRecord, RowError> {
        let row = self.row_mut(address)?;
        row.regenerating = false;
        let content = result?;
        row.draft_content = normalize_draft(&content);
        row.dirty = true;
        row.saved = false;
        Ok(&*row)
    }
}

/// A `RowSet` shared between requests. The lock is never held across a
/// save or a regeneration, so other rows stay editable meanwhile.
pub type Session = Mutex<RowSet>;

/// Persists the row's current draft and marks it saved, unless it was edited
/// again while the write was in flight. On failure the row is not marked saved.
pub async fn save_row(
    session: &Session,
    store: &ContentStore,
    address: &str,
) -> Result<ContactRecord, RowError> {
    let draft = session
        .lock()
        .await
        .get(address)
        .map(|row| row.draft_content.clone())
        .ok_or_else(|| RowError::UnknownAddress(address.to_string()))?;

    store.save(address, &draft).await?;

    let mut rows = session.lock().await;
    rows.mark_saved(address, &draft)?;
    rows.get(address)
        .cloned()
        .ok_or_else(|| RowError::UnknownAddress(address.to_string()))
}

/// Regenerates the row's draft from its job description.
///
/// The generator runs in its own task, so a caller that goes away mid-run
/// does not cancel it and the row always leaves the regenerating state.
pub async fn regenerate_row(
    session: Arc<Session>,
    regenerator: Arc<dyn Regenerator>,
    address: &str,
) -> Result<ContactRecord, RowError> {
    let job_description = session.lock().await.begin_regenerate(address)?;

    let address = address.to_string();
    let task = tokio::spawn({
        let session = session.clone();
        let address = address.clone();
        async move {
            let result = regenerate_draft(regenerator.as_ref(), &address, &job_description).await;
            let mut rows = session.lock().await;
            rows.finish_regenerate(&address, result).cloned()
        }
    });

    match task.await {
        Ok(result) => result,
        Err(e) => {
            error!("Regeneration task for {address} failed: {e}");
            if let Some(row) = session.lock().await.rows.get_mut(&address) {
                row.regenerating = false;
            }
            Err(RowError::Interrupted(address))
        }
    }
}
