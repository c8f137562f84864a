pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::dispatch::handlers as dispatch;
use crate::reconcile::handlers as contacts;
use crate::regeneration::handlers as regeneration;
use crate::sheets::handlers as sheets;
use crate::state::AppState;
use crate::store::handlers as store;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Drafts
        .route("/api/save-content", post(store::handle_save_content))
        .route("/api/content", get(store::handle_get_content))
        .route("/api/original-content", get(store::handle_get_original_content))
        // Spreadsheet
        .route("/api/job-descriptions", get(sheets::handle_get_job_descriptions))
        .route(
            "/api/job-description/:address",
            get(sheets::handle_get_job_description),
        )
        // Generation and dispatch
        .route(
            "/api/regenerate-email",
            post(regeneration::handle_regenerate_email),
        )
        .route("/api/send-emails", post(dispatch::handle_send_emails))
        .route(
            "/api/send-emails/:job_id",
            get(dispatch::handle_get_send_status),
        )
        // Contact rows
        .route("/api/contacts", get(contacts::handle_list_contacts))
        .route(
            "/api/contacts/:address/draft",
            put(contacts::handle_edit_draft),
        )
        .route("/api/contacts/:address/undo", post(contacts::handle_undo_draft))
        .route("/api/contacts/:address/save", post(contacts::handle_save_row))
        .route(
            "/api/contacts/:address/regenerate",
            post(contacts::handle_regenerate_row),
        )
        .with_state(state)
}
