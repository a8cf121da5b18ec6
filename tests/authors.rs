mod common;

use axum::http::StatusCode;
use common::{app, get, post_json, seed, sqlite_state, TestResult};
use serde_json::json;

#[tokio::test]
async fn get_author_lists_books_as_references() -> TestResult {
    let state = sqlite_state().await?;
    let lib = seed(&state).await?;
    let app = app(state);

    let (status, body) = get(&app, &format!("/authors/{}", lib.kierkegaard)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "id": lib.kierkegaard,
            "name": "Søren Kierkegaard",
            "birth": "1813-05-05",
            "death": "1855-11-11",
            "books": [{
                "id": lib.fear_and_trembling,
                "href": format!("/books/{}", lib.fear_and_trembling),
                "title": "Fear and Trembling",
            }],
            "href": format!("/authors/{}", lib.kierkegaard),
        })
    );
    Ok(())
}

#[tokio::test]
async fn missing_author_is_not_found() -> TestResult {
    let app = app(sqlite_state().await?);
    let (status, _) = get(&app, "/authors/1").await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn authors_collection_is_enveloped() -> TestResult {
    let state = sqlite_state().await?;
    seed(&state).await?;
    let app = app(state);

    let (status, body) = get(&app, "/authors?limit=1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], json!(1));
    assert_eq!(body["total"], json!(2));
    assert_eq!(body["items"][0]["name"], json!("Jean-Paul Sartre"));
    Ok(())
}

#[tokio::test]
async fn author_without_death_date_is_created() -> TestResult {
    let app = app(sqlite_state().await?);

    let (status, body) = post_json(
        &app,
        "/authors",
        &json!({"name": "Simone de Beauvoir", "birth": "1908-01-09", "death": null}),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["death"], json!(null));
    assert_eq!(body["books"], json!([]));

    let (status, body) =
        post_json(&app, "/authors", &json!({"name": "Albert Camus", "birth": "7 Nov 1913"})).await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["birth"], json!(["Not a valid date."]));
    Ok(())
}
