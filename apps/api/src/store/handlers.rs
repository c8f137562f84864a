use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::contact::is_valid_address;
use crate::state::AppState;
use crate::store::{ContentMap, CurrentContent};

#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub saved: usize,
}

/// POST /api/save-content
///
/// Body is an address → content mapping. Entries are merged over the
/// persisted overlay; addresses not in the body are left untouched.
pub async fn handle_save_content(
    State(state): State<AppState>,
    Json(entries): Json<ContentMap>,
) -> Result<Json<SaveResponse>, AppError> {
    if entries.is_empty() {
        return Err(AppError::Validation("No content to save".to_string()));
    }
    if let Some(bad) = entries.keys().find(|address| !is_valid_address(address)) {
        return Err(AppError::Validation(format!(
            "'{bad}' is not a valid email address"
        )));
    }

    let saved = entries.len();
    state.store.save_all(entries).await?;

    Ok(Json(SaveResponse {
        success: true,
        saved,
    }))
}

/// GET /api/content
///
/// Current drafts: the overlay when present, otherwise the baseline corpus.
pub async fn handle_get_content(State(state): State<AppState>) -> Json<CurrentContent> {
    Json(state.store.current().await)
}

/// GET /api/original-content
pub async fn handle_get_original_content(State(state): State<AppState>) -> Json<ContentMap> {
    Json(state.store.baseline().clone())
}
