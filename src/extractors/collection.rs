//! Pagination arguments from the query string (`limit`, `offset`).

use crate::error::AppError;
use crate::response::{DEFAULT_LIMIT, DEFAULT_OFFSET};
use crate::schema::{FieldErrors, SCHEMA_KEY};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

pub const LIMIT_PARAM: &str = "limit";
pub const OFFSET_PARAM: &str = "offset";

/// Parsed `limit`/`offset`, defaulting to 20/0. Malformed values reject the
/// request with 400 and a per-argument error batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CollectionArgs {
    pub limit: u32,
    pub offset: u32,
}

impl Default for CollectionArgs {
    fn default() -> Self {
        CollectionArgs {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
        }
    }
}

impl CollectionArgs {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut args = CollectionArgs::default();
        for (name, slot) in [(LIMIT_PARAM, &mut args.limit), (OFFSET_PARAM, &mut args.offset)] {
            if let Some(raw) = params.get(name) {
                match parse_count(raw) {
                    Ok(n) => *slot = n,
                    Err(msg) => errors.add(name, msg),
                }
            }
        }
        errors.into_result(args)
    }
}

fn parse_count(raw: &str) -> Result<u32, &'static str> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Ok(n);
    }
    match raw.parse::<i64>() {
        Ok(n) if n < 0 => Err("Must be greater than or equal to 0."),
        Ok(_) => Err("Number is too large."),
        Err(_) => Err("Not a valid integer."),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CollectionArgs
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::InvalidQuery(FieldErrors::single(SCHEMA_KEY, e.body_text())))?;
        CollectionArgs::from_params(&params).map_err(AppError::InvalidQuery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_absent() {
        let args = CollectionArgs::from_params(&params(&[("sort", "title")])).unwrap();
        assert_eq!(args, CollectionArgs { limit: 20, offset: 0 });
    }

    #[test]
    fn values_are_parsed() {
        let args = CollectionArgs::from_params(&params(&[("limit", "5"), ("offset", " 10 ")])).unwrap();
        assert_eq!(args, CollectionArgs { limit: 5, offset: 10 });
    }

    #[test]
    fn malformed_values_are_reported_per_argument() {
        let errors =
            CollectionArgs::from_params(&params(&[("limit", "ten"), ("offset", "-1")])).unwrap_err();
        assert_eq!(errors.get("limit").unwrap(), ["Not a valid integer."]);
        assert_eq!(errors.get("offset").unwrap(), ["Must be greater than or equal to 0."]);
    }
}
