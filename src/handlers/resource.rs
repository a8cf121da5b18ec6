//! Resource descriptors and the generic read/create handlers shared by every resource.

use crate::error::{AppError, UrlError};
use crate::extractors::CollectionArgs;
use crate::model::Row;
use crate::response::CollectionContext;
use crate::schema::{Dumped, Schema};
use crate::state::AppState;
use crate::store::Query;
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// An HTTP resource: an axum path template, an endpoint name and the record
/// type it serves.
#[derive(Debug, PartialEq, Eq)]
pub struct ResourceDef {
    pub path: &'static str,
    pub endpoint: &'static str,
    pub model: &'static str,
}

fn param_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").ok())
        .as_ref()
}

impl ResourceDef {
    /// Path parameters in template order.
    pub fn params(&self) -> Vec<&'static str> {
        param_pattern()
            .into_iter()
            .flat_map(|re| re.captures_iter(self.path))
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Whether the path addresses one record rather than the collection.
    pub fn is_item(&self) -> bool {
        !self.params().is_empty()
    }

    /// `/books/:id` becomes `/books/{id}`.
    pub fn openapi_path(&self) -> String {
        match param_pattern() {
            Some(re) => re.replace_all(self.path, "{$1}").into_owned(),
            None => self.path.to_string(),
        }
    }

    /// Resolves the path template with the given key values.
    pub fn url_for(&self, values: &[(&str, &Value)]) -> Result<String, UrlError> {
        let Some(re) = param_pattern() else {
            return Ok(self.path.to_string());
        };
        let mut url = String::with_capacity(self.path.len() + 8);
        let mut last = 0;
        for caps in re.captures_iter(self.path) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let key = key.as_str();
            let value = values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .filter(|v| !v.is_null())
                .ok_or_else(|| UrlError::MissingKey {
                    path: self.path.to_string(),
                    key: key.to_string(),
                })?;
            url.push_str(&self.path[last..whole.start()]);
            url.push_str(&segment(key, value)?);
            last = whole.end();
        }
        url.push_str(&self.path[last..]);
        Ok(url)
    }
}

fn segment(key: &str, value: &Value) -> Result<String, UrlError> {
    let invalid = || UrlError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        Value::String(s) if !s.is_empty() && !s.contains(['/', '?', '#']) => Ok(s.clone()),
        _ => Err(invalid()),
    }
}

/// Path ids that are not integers match no record.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

/// Logs the dump's field errors; the representation is returned regardless.
fn representation(resource: &ResourceDef, dumped: Dumped<Value>) -> Value {
    if !dumped.errors.is_empty() {
        tracing::warn!(
            endpoint = resource.endpoint,
            errors = %dumped.errors,
            "representation has field errors"
        );
    }
    dumped.data
}

fn lookup<'a>(state: &'a AppState, resource: &ResourceDef) -> Result<&'a Schema, AppError> {
    state.models.schema(resource.model)
}

async fn fetch_one(state: &AppState, schema: &Schema, id: i64) -> Result<Option<Row>, AppError> {
    state.store.get(schema.record(), id).await
}

/// Single record by primary key, flat.
pub async fn read_one(state: &AppState, resource: &ResourceDef, id: &str) -> Result<Value, AppError> {
    let schema = lookup(state, resource)?;
    let not_found = || AppError::NotFound(format!("{} {}", schema.record().name, id));
    let pk = parse_id(id).ok_or_else(not_found)?;
    let row = fetch_one(state, schema, pk).await?.ok_or_else(not_found)?;
    Ok(representation(
        resource,
        schema.dump(&row, &CollectionContext::default()),
    ))
}

/// One page of records, enveloped with the unbounded total.
pub async fn read_many(
    state: &AppState,
    resource: &ResourceDef,
    args: CollectionArgs,
) -> Result<Value, AppError> {
    let schema = lookup(state, resource)?;
    let query = Query::new(schema.record())
        .offset(args.offset)
        .limit(args.limit);
    let rows = state.store.fetch(&query).await?;
    let total = state.store.count(&query).await?;
    tracing::debug!(
        endpoint = resource.endpoint,
        limit = args.limit,
        offset = args.offset,
        total,
        "collection"
    );
    let ctx = CollectionContext::new(args.limit, args.offset, total);
    Ok(representation(resource, schema.dump(&rows, &ctx)))
}

/// Loads `body` through the schema, stores it and returns the stored record.
pub async fn create(state: &AppState, resource: &ResourceDef, body: &Value) -> Result<Value, AppError> {
    let schema = lookup(state, resource)?;
    let loaded = schema.load(body).map_err(AppError::Validation)?;
    let pk = state.store.insert(schema.record(), &loaded).await?;
    tracing::info!(record = schema.record().name, id = pk, "created");
    let row = fetch_one(state, schema, pk)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", schema.record().name, pk)))?;
    Ok(representation(
        resource,
        schema.dump(&row, &CollectionContext::default()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    static SHELF: ResourceDef = ResourceDef {
        path: "/rooms/:room/shelves/:id",
        endpoint: "shelf",
        model: "Shelf",
    };

    #[test]
    fn url_for_fills_every_parameter() {
        let url = SHELF
            .url_for(&[("id", &json!(12)), ("room", &json!("annex"))])
            .unwrap();
        assert_eq!(url, "/rooms/annex/shelves/12");
        assert_eq!(SHELF.params(), ["room", "id"]);
        assert_eq!(SHELF.openapi_path(), "/rooms/{room}/shelves/{id}");
    }

    #[test]
    fn url_for_reports_missing_and_unusable_values() {
        assert_eq!(
            SHELF.url_for(&[("room", &json!("annex"))]).unwrap_err(),
            UrlError::MissingKey {
                path: SHELF.path.into(),
                key: "id".into()
            }
        );
        assert!(matches!(
            SHELF.url_for(&[("room", &json!("a/b")), ("id", &json!(1))]),
            Err(UrlError::InvalidValue { .. })
        ));
        assert!(SHELF
            .url_for(&[("room", &json!("annex")), ("id", &Value::Null)])
            .is_err());
    }

    #[test]
    fn collection_paths_have_no_parameters() {
        let books = ResourceDef {
            path: "/books",
            endpoint: "books",
            model: "Book",
        };
        assert!(!books.is_item());
        assert_eq!(books.url_for(&[]).unwrap(), "/books");
        assert_eq!(parse_id("7"), Some(7));
        assert_eq!(parse_id("seven"), None);
    }
}
