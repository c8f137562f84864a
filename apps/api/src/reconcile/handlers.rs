use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::contact::{ContactRecord, RowState};
use crate::reconcile::refresh_session;
use crate::reconcile::rows::{regenerate_row, save_row};
use crate::sheets::source::FetchStatus;
use crate::state::AppState;
use crate::store::ContentSource;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRow {
    #[serde(flatten)]
    pub record: ContactRecord,
    pub state: RowState,
}

impl From<ContactRecord> for ContactRow {
    fn from(record: ContactRecord) -> Self {
        let state = record.state();
        Self { record, state }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactsResponse {
    pub sheet_status: FetchStatus,
    pub content_source: ContentSource,
    pub rows: Vec<ContactRow>,
}

#[derive(Debug, Deserialize)]
pub struct EditDraftRequest {
    pub content: String,
}

/// GET /api/contacts
///
/// Re-reads the spreadsheet and the draft store, then returns every row.
/// Unsaved edits survive the refresh.
pub async fn handle_list_contacts(State(state): State<AppState>) -> Json<ContactsResponse> {
    let report = refresh_session(&state.session, &state.sheets, &state.store).await;
    let rows = state
        .session
        .lock()
        .await
        .rows()
        .cloned()
        .map(ContactRow::from)
        .collect();

    Json(ContactsResponse {
        sheet_status: report.sheet_status,
        content_source: report.content_source,
        rows,
    })
}

/// PUT /api/contacts/:address/draft
pub async fn handle_edit_draft(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Json(request): Json<EditDraftRequest>,
) -> Result<Json<ContactRow>, AppError> {
    let mut rows = state.session.lock().await;
    let row = rows.edit(&address, request.content)?;
    Ok(Json(row.clone().into()))
}

/// POST /api/contacts/:address/undo
pub async fn handle_undo_draft(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ContactRow>, AppError> {
    let mut rows = state.session.lock().await;
    let row = rows.undo(&address)?;
    Ok(Json(row.clone().into()))
}

/// POST /api/contacts/:address/save
pub async fn handle_save_row(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ContactRow>, AppError> {
    let row = save_row(&state.session, &state.store, &address).await?;
    Ok(Json(row.into()))
}

/// POST /api/contacts/:address/regenerate
///
/// Replaces the row's draft with a freshly generated one. The new draft is
/// left unsaved.
pub async fn handle_regenerate_row(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<ContactRow>, AppError> {
    let row = regenerate_row(state.session.clone(), state.regenerator.clone(), &address).await?;
    Ok(Json(row.into()))
}
