use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::DispatchTrigger;
use crate::reconcile::rows::Session;
use crate::regeneration::Regenerator;
use crate::sheets::source::SpreadsheetSource;
use crate::store::ContentStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub sheets: Arc<SpreadsheetSource>,
    pub store: Arc<ContentStore>,
    /// Pluggable draft generator. Default: SubprocessRegenerator.
    pub regenerator: Arc<dyn Regenerator>,
    pub dispatcher: DispatchTrigger,
    /// Contact rows being edited. One session per process.
    pub session: Arc<Session>,
    pub config: Config,
}
