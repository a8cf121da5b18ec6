//! Typed errors and HTTP mapping.

use crate::schema::FieldErrors;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors raised while declaring, setting, or loading configuration variables.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid conf var type: {0}")]
    InvalidConfVarType(String),
    #[error("no such conf var: {0}")]
    NoSuchConfVar(String),
    #[error("invalid conf var value: {0}")]
    InvalidConfVarValue(String),
}

/// Record descriptor inconsistencies, detected when the model registry is built.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("missing reference: {kind} '{id}'")]
    MissingReference { kind: &'static str, id: String },
    #[error("invalid primary key: record {record} column {column}")]
    InvalidPrimaryKey { record: String, column: String },
    #[error("duplicate record type: {0}")]
    DuplicateRecordType(String),
    #[error("asymmetric relationship: {record}.{relationship}")]
    AsymmetricRelationship { record: String, relationship: String },
    #[error("resource {endpoint} serves {served}, declared on {record}")]
    ResourceMismatch {
        endpoint: String,
        served: String,
        record: String,
    },
}

/// Failure to resolve a resource path template.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UrlError {
    #[error("missing value for '{key}' in {path}")]
    MissingKey { path: String, key: String },
    #[error("value for '{key}' cannot be used in a url: {value}")]
    InvalidValue { key: String, value: String },
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Url(#[from] UrlError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid query arguments: {0}")]
    InvalidQuery(FieldErrors),
    #[error("validation: {0}")]
    Validation(FieldErrors),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Model(_) => (StatusCode::INTERNAL_SERVER_ERROR, "model_error"),
            AppError::Url(_) => (StatusCode::INTERNAL_SERVER_ERROR, "url_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::InvalidQuery(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error"),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let details = match &self {
            AppError::InvalidQuery(errors) | AppError::Validation(errors) => {
                serde_json::to_value(errors).ok()
            }
            _ => None,
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_the_error_kind() {
        let cases = [
            (AppError::NotFound("Book 9".into()), StatusCode::NOT_FOUND),
            (
                AppError::InvalidQuery(FieldErrors::single("limit", "Not a valid integer.")),
                StatusCode::BAD_REQUEST,
            ),
            (
                AppError::Validation(FieldErrors::single("title", "Missing data for required field.")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (AppError::Db(sqlx::Error::PoolClosed), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::Db(sqlx::Error::RowNotFound), StatusCode::NOT_FOUND),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }
}
