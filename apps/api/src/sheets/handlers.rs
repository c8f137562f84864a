use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Reports how the description map was produced (fresh, cached, empty, degraded).
pub const SHEET_STATUS_HEADER: &str = "x-sheet-status";

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct DescriptionsQuery {
    /// Skip the freshness window and read the sheet now.
    #[serde(default)]
    pub refresh: bool,
}

/// GET /api/job-descriptions?refresh=true
pub async fn handle_get_job_descriptions(
    State(state): State<AppState>,
    Query(query): Query<DescriptionsQuery>,
) -> impl IntoResponse {
    if query.refresh {
        state.sheets.invalidate();
    }
    let outcome = state.sheets.fetch_all().await;
    (
        [(SHEET_STATUS_HEADER, outcome.status.as_str())],
        Json(outcome.descriptions),
    )
}

/// GET /api/job-description/:address
pub async fn handle_get_job_description(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<DescriptionResponse> {
    let description = state.sheets.description_for(&address).await;
    Json(DescriptionResponse { description })
}
