use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::regeneration::regenerate_draft;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerateRequest {
    pub email: String,
    /// Looked up from the spreadsheet when omitted.
    pub job_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegenerateResponse {
    pub content: String,
}

/// POST /api/regenerate-email
///
/// Waits for the generator and returns the new draft. The draft is not saved.
pub async fn handle_regenerate_email(
    State(state): State<AppState>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Json<RegenerateResponse>, AppError> {
    let job_description = match request.job_description {
        Some(jd) => jd,
        None => state.sheets.description_for(request.email.trim()).await,
    };

    let content =
        regenerate_draft(state.regenerator.as_ref(), &request.email, &job_description).await?;

    Ok(Json(RegenerateResponse { content }))
}
