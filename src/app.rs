//! Router assembly and startup wiring shared by the server binary and tests.

use crate::config::{sqlite_uri, Settings};
use crate::error::AppError;
use crate::migration::apply_migrations;
use crate::model::{Models, RECORD_TYPES};
use crate::routes::{api_routes, common_routes};
use crate::state::AppState;
use crate::store::{connect, SqliteStore};
use axum::Router;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this size are rejected with 413.
pub const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Common and resource routes over `state`. `trace` adds per-request spans.
pub fn router(state: AppState, trace: bool) -> Router {
    let app = Router::new()
        .merge(common_routes(state.clone()))
        .merge(api_routes(state))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES));
    if trace {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

/// Validates the record types, opens and migrates the database named by the
/// `db` settings, and returns the state handlers share.
pub async fn create_state(settings: &Settings) -> Result<AppState, AppError> {
    let models = Models::build(RECORD_TYPES)?;
    let uri = sqlite_uri(&settings.db)?;
    let pool = connect(&uri).await?;
    apply_migrations(&pool, RECORD_TYPES).await?;
    let store = SqliteStore::new(pool, RECORD_TYPES);
    Ok(AppState::new(Arc::new(store), models))
}

/// The full application for `settings`.
pub async fn create_app(settings: &Settings) -> Result<Router, AppError> {
    let state = create_state(settings).await?;
    Ok(router(state, settings.debug()?))
}
