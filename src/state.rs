//! Shared application state for all routes.

use crate::model::Models;
use crate::store::RecordStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    /// Record types and schemas, read-only after startup.
    pub models: Arc<Models>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, models: Models) -> Self {
        AppState {
            store,
            models: Arc::new(models),
        }
    }
}
