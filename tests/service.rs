mod common;

use axum::http::StatusCode;
use common::{app, get, sqlite_state, TestResult};
use my_library::{create_state, Settings};
use serde_json::json;

#[tokio::test]
async fn health_ready_and_version() -> TestResult {
    let app = app(sqlite_state().await?);

    let (status, body) = get(&app, "/health").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = get(&app, "/ready").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], json!("ok"));

    let (_, body) = get(&app, "/version").await?;
    assert_eq!(body["name"], json!("my-library"));
    Ok(())
}

#[tokio::test]
async fn swagger_documents_the_resources() -> TestResult {
    let app = app(sqlite_state().await?);
    let (status, body) = get(&app, "/swagger.json").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/books/{id}"]["get"].is_object());
    assert!(body["components"]["schemas"]["Author"].is_object());
    Ok(())
}

#[tokio::test]
async fn sqlite_file_and_parent_directory_are_created() -> TestResult {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("local").join("local.sqlite");
    let host = path.to_string_lossy().into_owned();
    let settings = Settings::load_from(|key| (key == "DB_HOST").then(|| host.clone()))?;

    create_state(&settings).await?;
    assert!(path.exists());

    // Migrations are idempotent.
    create_state(&settings).await?;
    Ok(())
}

#[tokio::test]
async fn unsupported_engine_fails_at_startup() -> TestResult {
    let settings = Settings::load_from(|key| (key == "DB_ENGINE").then(|| "mysql".to_string()))?;
    assert!(create_state(&settings).await.is_err());
    Ok(())
}
