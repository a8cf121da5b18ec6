//! Author resources: `/authors` and `/authors/:id`.

use crate::error::AppError;
use crate::extractors::CollectionArgs;
use crate::handlers::resource::{self, ResourceDef};
use crate::response;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub static AUTHOR_RESOURCE: ResourceDef = ResourceDef {
    path: "/authors/:id",
    endpoint: "author",
    model: "Author",
};

pub static AUTHORS_RESOURCE: ResourceDef = ResourceDef {
    path: "/authors",
    endpoint: "authors",
    model: "Author",
};

pub async fn get_author(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::ok(resource::read_one(&state, &AUTHOR_RESOURCE, &id).await?))
}

pub async fn list_authors(
    State(state): State<AppState>,
    args: CollectionArgs,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::ok(resource::read_many(&state, &AUTHORS_RESOURCE, args).await?))
}

pub async fn create_author(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::created(resource::create(&state, &AUTHORS_RESOURCE, &body).await?))
}
