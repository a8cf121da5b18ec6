//! my-library: a REST service for authors and books whose JSON representations
//! are derived from the record descriptors.

pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod schema;
pub mod sql;
pub mod state;
pub mod store;

pub use app::{create_app, create_state, router};
pub use config::{Config, ConfVar, Settings};
pub use error::{AppError, ConfigError, ModelError, UrlError};
pub use migration::apply_migrations;
pub use model::{Models, RecordType, RECORD_TYPES};
pub use response::{CollectionContext, Envelope};
pub use schema::{FieldErrors, Schema};
pub use state::AppState;
pub use store::{connect, Query, RecordStore, SqliteStore};
