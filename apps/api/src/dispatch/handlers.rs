use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::dispatch::DispatchJob;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub message: String,
    pub success: bool,
    pub job_id: Uuid,
    pub started_at: DateTime<Utc>,
}

/// POST /api/send-emails
///
/// Acknowledges that the batch was started. Completion is reported through
/// the job status endpoint and the logs, never through this response.
pub async fn handle_send_emails(
    State(state): State<AppState>,
) -> Result<Json<SendResponse>, AppError> {
    let ticket = state.dispatcher.trigger_send()?;
    Ok(Json(SendResponse {
        message: "Email sending process started".to_string(),
        success: true,
        job_id: ticket.job_id,
        started_at: ticket.started_at,
    }))
}

/// GET /api/send-emails/:job_id
pub async fn handle_get_send_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<DispatchJob>, AppError> {
    state
        .dispatcher
        .job(job_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Dispatch job {job_id} not found")))
}
