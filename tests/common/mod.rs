#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use my_library::model::Row;
use my_library::schema::LoadedRecord;
use my_library::{
    create_state, router, AppError, AppState, Models, Query, RecordStore, RecordType, Settings,
    RECORD_TYPES,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub type TestResult<T = ()> = Result<T, Box<dyn Error>>;

/// State over a migrated in-memory SQLite database.
pub async fn sqlite_state() -> TestResult<AppState> {
    let settings = Settings::load_from(|key| (key == "DB_ENGINE").then(|| "memory".to_string()))?;
    Ok(create_state(&settings).await?)
}

pub fn app(state: AppState) -> Router {
    router(state, false)
}

/// Loads `body` through the record's schema and stores it.
pub async fn insert(state: &AppState, record: &str, body: Value) -> TestResult<i64> {
    let schema = state.models.schema(record)?;
    let loaded = schema.load(&body).map_err(|e| e.to_string())?;
    Ok(state.store.insert(schema.record(), &loaded).await?)
}

pub struct Library {
    pub sartre: i64,
    pub kierkegaard: i64,
    pub nausea: i64,
    pub fear_and_trembling: i64,
}

/// Two authors and one book by each.
pub async fn seed(state: &AppState) -> TestResult<Library> {
    let sartre = insert(
        state,
        "Author",
        json!({"name": "Jean-Paul Sartre", "birth": "1905-06-21", "death": "1980-04-15"}),
    )
    .await?;
    let kierkegaard = insert(
        state,
        "Author",
        json!({"name": "Søren Kierkegaard", "birth": "1813-05-05", "death": "1855-11-11"}),
    )
    .await?;
    let nausea = insert(
        state,
        "Book",
        json!({"title": "La Nausée", "published": 1938, "authors": [sartre]}),
    )
    .await?;
    let fear_and_trembling = insert(
        state,
        "Book",
        json!({"title": "Fear and Trembling", "published": 1843, "authors": [{"id": kierkegaard}]}),
    )
    .await?;
    Ok(Library {
        sartre,
        kierkegaard,
        nausea,
        fear_and_trembling,
    })
}

async fn send(app: &Router, req: Request<Body>) -> TestResult<(StatusCode, Value)> {
    let resp = app.clone().oneshot(req).await?;
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, body))
}

pub async fn get(app: &Router, uri: &str) -> TestResult<(StatusCode, Value)> {
    let req = Request::builder()
        .uri(uri)
        .method(Method::GET)
        .body(Body::empty())?;
    send(app, req).await
}

pub async fn post_json(app: &Router, uri: &str, body: &Value) -> TestResult<(StatusCode, Value)> {
    let req = Request::builder()
        .uri(uri)
        .method(Method::POST)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?;
    send(app, req).await
}

/// In-memory record store keyed by record type name. Rows are stored exactly
/// as given, relationships included.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<&'static str, Vec<Row>>>,
}

impl MemoryStore {
    pub fn with_rows(record_type: &'static RecordType, rows: Vec<Row>) -> Self {
        let store = MemoryStore::default();
        if let Ok(mut map) = store.rows.lock() {
            map.insert(record_type.name, rows);
        }
        store
    }

    fn rows_of(&self, record_type: &RecordType) -> Result<Vec<Row>, AppError> {
        let map = self
            .rows
            .lock()
            .map_err(|_| AppError::Db(sqlx::Error::PoolClosed))?;
        Ok(map.get(record_type.name).cloned().unwrap_or_default())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, record_type: &RecordType, id: i64) -> Result<Option<Row>, AppError> {
        Ok(self
            .rows_of(record_type)?
            .into_iter()
            .find(|r| record_type.pk_of(r) == Some(id)))
    }

    async fn fetch(&self, query: &Query<'_>) -> Result<Vec<Row>, AppError> {
        let rows = self.rows_of(query.record_type)?;
        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map(|n| n as usize).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(&self, query: &Query<'_>) -> Result<u64, AppError> {
        Ok(self.rows_of(query.record_type)?.len() as u64)
    }

    async fn insert(&self, record_type: &RecordType, record: &LoadedRecord) -> Result<i64, AppError> {
        let mut map = self
            .rows
            .lock()
            .map_err(|_| AppError::Db(sqlx::Error::PoolClosed))?;
        let rows = map.entry(record_type.name).or_default();
        let id = rows.len() as i64 + 1;
        let mut row = record.values.clone();
        row.insert(record_type.primary_key.to_string(), json!(id));
        for rel in record_type.relationships {
            row.insert(rel.name.to_string(), json!([]));
        }
        rows.push(row);
        Ok(id)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

pub fn memory_state(store: MemoryStore) -> TestResult<AppState> {
    Ok(AppState::new(Arc::new(store), Models::build(RECORD_TYPES)?))
}
