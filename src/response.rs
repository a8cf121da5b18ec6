//! Collection envelope: pagination metadata wrapped around every multi-record response.

use crate::schema::FieldErrors;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_LIMIT: u32 = 20;
pub const DEFAULT_OFFSET: u32 = 0;
/// Key holding the serialized records, on dump and on load.
pub const ENVELOPE_KEY: &str = "items";

/// Pagination context for one collection response. `total` is the number of
/// records matching the query ignoring limit and offset; it falls back to the
/// number of items returned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollectionContext {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub total: Option<u64>,
}

impl CollectionContext {
    pub fn new(limit: u32, offset: u32, total: u64) -> Self {
        CollectionContext {
            limit: Some(limit),
            offset: Some(offset),
            total: Some(total),
        }
    }
}

/// `{count, total, limit, offset, items}`. The metadata is dump-only: loading
/// reads `items` and ignores the rest.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub count: u64,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub items: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn wrap(items: Vec<T>, ctx: &CollectionContext) -> Self {
        let count = items.len() as u64;
        Envelope {
            count,
            total: ctx.total.unwrap_or(count),
            limit: ctx.limit.unwrap_or(DEFAULT_LIMIT),
            offset: ctx.offset.unwrap_or(DEFAULT_OFFSET),
            items,
        }
    }
}

impl<T: Serialize> Envelope<T> {
    pub fn into_value(self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

/// The enveloped items of a collection body.
pub fn unwrap_items(data: &Value) -> Result<&[Value], FieldErrors> {
    let obj = data
        .as_object()
        .ok_or_else(|| FieldErrors::single(crate::schema::SCHEMA_KEY, "Invalid input type."))?;
    match obj.get(ENVELOPE_KEY) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(FieldErrors::single(ENVELOPE_KEY, "Not a valid list.")),
        None => Err(FieldErrors::single(ENVELOPE_KEY, "Missing data for required field.")),
    }
}

pub fn ok(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(data))
}

pub fn created(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn total_defaults_to_count() {
        let env = Envelope::wrap(vec![1, 2, 3], &CollectionContext::default());
        assert_eq!((env.count, env.total, env.limit, env.offset), (3, 3, DEFAULT_LIMIT, 0));
    }

    #[test]
    fn context_values_are_reported() {
        let env = Envelope::wrap(vec![json!({"id": 7})], &CollectionContext::new(1, 6, 40));
        assert_eq!(
            env.into_value().unwrap(),
            json!({"count": 1, "total": 40, "limit": 1, "offset": 6, "items": [{"id": 7}]})
        );
    }

    #[test]
    fn load_side_needs_only_items() {
        let body = json!({"count": 2, "total": 9, "items": [4, 5]});
        assert_eq!(unwrap_items(&body).unwrap(), [json!(4), json!(5)]);
        assert_eq!(unwrap_items(&json!({"items": []})).unwrap().len(), 0);
        let errors = unwrap_items(&json!({"count": 0})).unwrap_err();
        assert_eq!(errors.get("items").unwrap(), ["Missing data for required field."]);
        assert!(unwrap_items(&json!([1])).is_err());
    }
}
