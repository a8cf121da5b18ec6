mod common;

use axum::http::StatusCode;
use common::{app, get, memory_state, MemoryStore, TestResult};
use my_library::model::library::BOOK;
use my_library::model::Row;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn books(n: i64) -> Vec<Row> {
    (1..=n)
        .filter_map(|id| match json!({"id": id, "title": format!("Volume {}", id), "published": 1900 + id, "authors": []}) {
            Value::Object(row) => Some(row),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn count_and_total_follow_limit_and_offset() -> TestResult {
    for n in [0_i64, 1, 7, 25] {
        let app = app(memory_state(MemoryStore::with_rows(&BOOK, books(n)))?);
        for (limit, offset) in [(20_i64, 0_i64), (5, 0), (5, 5), (3, 6), (10, 30), (0, 0)] {
            let (status, body) = get(&app, &format!("/books?limit={}&offset={}", limit, offset)).await?;
            assert_eq!(status, StatusCode::OK);
            let expected = limit.min((n - offset).max(0));
            assert_eq!(body["count"], json!(expected), "n={} limit={} offset={}", n, limit, offset);
            assert_eq!(body["total"], json!(n));
            assert_eq!(body["limit"], json!(limit));
            assert_eq!(body["offset"], json!(offset));
            assert_eq!(body["items"].as_array().map(Vec::len), Some(expected as usize));
        }
    }
    Ok(())
}

#[tokio::test]
async fn dumped_collection_loads_back_to_the_same_keys() -> TestResult {
    let state = memory_state(MemoryStore::with_rows(&BOOK, books(4)))?;
    let schema = state.models.schema("Book")?;
    let app = app(state.clone());

    let (_, body) = get(&app, "/books").await?;
    let loaded = schema.load_many(&body).map_err(|e| e.to_string())?;
    let keys: BTreeSet<i64> = loaded.iter().filter_map(|r| r.primary_key).collect();
    assert_eq!(keys, BTreeSet::from([1, 2, 3, 4]));
    Ok(())
}

#[tokio::test]
async fn malformed_related_record_still_yields_a_response() -> TestResult {
    let mut rows = books(1);
    rows[0].insert("authors".into(), json!([{"id": "nine", "name": "Søren Kierkegaard"}, {"id": 3, "name": "Jean-Paul Sartre"}]));
    let app = app(memory_state(MemoryStore::with_rows(&BOOK, rows))?);

    let (status, body) = get(&app, "/books/1").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], json!("Volume 1"));
    assert_eq!(
        body["authors"],
        json!([{"id": 3, "href": "/authors/3", "name": "Jean-Paul Sartre"}])
    );
    Ok(())
}
