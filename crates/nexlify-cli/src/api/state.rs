//! Application state for the API server

use nexlify::{BatchOrchestrator, FileStore};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Runs conversion batches
    pub orchestrator: Arc<BatchOrchestrator>,

    /// Where artifacts are read from for downloads
    pub store: FileStore,
}

impl AppState {
    /// Create state serving the orchestrator's own store
    pub fn new(orchestrator: Arc<BatchOrchestrator>) -> Self {
        let store = orchestrator.store().clone();
        Self {
            orchestrator,
            store,
        }
    }
}
