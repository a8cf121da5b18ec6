//! Resource routes and the generated OpenAPI document.

use crate::handlers::{authors, books, RESOURCES};
use crate::openapi::openapi;
use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};

async fn swagger(State(state): State<AppState>) -> Json<utoipa::openapi::OpenApi> {
    Json(openapi(&state.models, RESOURCES))
}

pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            books::BOOKS_RESOURCE.path,
            get(books::list_books).post(books::create_book),
        )
        .route(books::BOOK_RESOURCE.path, get(books::get_book))
        .route(
            authors::AUTHORS_RESOURCE.path,
            get(authors::list_authors).post(authors::create_author),
        )
        .route(authors::AUTHOR_RESOURCE.path, get(authors::get_author))
        .route("/swagger.json", get(swagger))
        .with_state(state)
}
