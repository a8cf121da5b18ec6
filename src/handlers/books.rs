//! Book resources: `/books` and `/books/:id`.

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

pub static BOOK_RESOURCE: ResourceDef = ResourceDef {
    path: "/books/:id",
    endpoint: "book",
    model: "Book",
};

pub static BOOKS_RESOURCE: ResourceDef = ResourceDef {
    path: "/books",
    endpoint: "books",
    model: "Book",
};

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::ok(resource::read_one(&state, &BOOK_RESOURCE, &id).await?))
}

pub async fn list_books(
    State(state): State<AppState>,
    args: CollectionArgs,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::ok(resource::read_many(&state, &BOOKS_RESOURCE, args).await?))
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    Ok(response::created(resource::create(&state, &BOOKS_RESOURCE, &body).await?))
}
