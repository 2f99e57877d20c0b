mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{get, post_json, post_raw, spawn_app};

#[tokio::test]
async fn create_then_list_and_stats_on_fresh_store() {
    let app = spawn_app().await;

    let (status, body) = post_json(
        &app,
        "/api/words",
        json!({
            "word": "ubiquitous",
            "meaning": "present everywhere",
            "phonetic_us": "/juːˈbɪkwɪtəs/"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "id": 1 }));

    let (status, stats) = get(&app, "/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats, json!({ "totalWords": 1 }));

    let (status, list) = get(&app, "/api/words").await;
    assert_eq!(status, StatusCode::OK);
    let items = list.as_array().expect("bare array");
    assert_eq!(items.len(), 1);

    let item = &items[0];
    assert_eq!(item["id"], 1);
    assert_eq!(item["word"], "ubiquitous");
    assert_eq!(item["meaning"], "present everywhere");
    assert_eq!(item["phonetic_us"], "/juːˈbɪkwɪtəs/");
    assert!(item["context_sentence"].is_null());
    assert!(item["image_url"].is_null());

    let created_at = item["created_at"].as_str().expect("created_at string");
    chrono::DateTime::parse_from_rfc3339(created_at).expect("created_at is RFC 3339");
    assert!(created_at.ends_with('Z'));
}

#[tokio::test]
async fn list_is_newest_first_and_idempotent() {
    let app = spawn_app().await;

    for word in ["alpha", "beta", "gamma"] {
        let (status, _) = post_json(&app, "/api/words", json!({ "word": word })).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, first) = get(&app, "/api/words").await;
    assert_eq!(status, StatusCode::OK);
    let words: Vec<&str> = first
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["word"].as_str().unwrap())
        .collect();
    assert_eq!(words, ["gamma", "beta", "alpha"]);

    let (_, second) = get(&app, "/api/words").await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn ids_are_distinct_and_increasing() {
    let app = spawn_app().await;

    let mut ids = Vec::new();
    for word in ["one", "two", "three"] {
        let (_, body) = post_json(&app, "/api/words", json!({ "word": word })).await;
        ids.push(body["id"].as_i64().unwrap());
    }

    assert_eq!(ids, [1, 2, 3]);
}

#[tokio::test]
async fn duplicate_surface_text_creates_separate_rows() {
    let app = spawn_app().await;

    let (_, first) = post_json(&app, "/api/words", json!({ "word": "echo" })).await;
    let (_, second) = post_json(&app, "/api/words", json!({ "word": "echo" })).await;
    assert_ne!(first["id"], second["id"]);

    let (_, stats) = get(&app, "/api/stats").await;
    assert_eq!(stats, json!({ "totalWords": 2 }));
}

#[tokio::test]
async fn missing_word_is_rejected() {
    let app = spawn_app().await;

    let (status, body) = post_json(&app, "/api/words", json!({ "meaning": "orphan" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (_, stats) = get(&app, "/api/stats").await;
    assert_eq!(stats, json!({ "totalWords": 0 }));
}

#[tokio::test]
async fn whitespace_word_is_rejected() {
    let app = spawn_app().await;

    let (status, body) = post_json(&app, "/api/words", json!({ "word": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_json_body_is_a_bad_request() {
    let app = spawn_app().await;

    let (status, body) = post_raw(&app, "/api/words", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn blank_optional_fields_are_stored_as_null() {
    let app = spawn_app().await;

    let (status, _) = post_json(
        &app,
        "/api/words",
        json!({ "word": "terse", "meaning": "  ", "image_url": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = get(&app, "/api/words").await;
    let item = &list.as_array().unwrap()[0];
    assert!(item["meaning"].is_null());
    assert!(item["image_url"].is_null());
}

#[tokio::test]
async fn unknown_route_returns_json_not_found() {
    let app = spawn_app().await;

    let (status, body) = get(&app, "/api/nothing-here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = spawn_app().await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "connected");

    let (status, body) = get(&app, "/health/live").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get(&app, "/api/health/info").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "vocasnap-backend");
}

#[tokio::test]
async fn ai_endpoints_answer_503_without_api_key() {
    let app = spawn_app().await;

    let cases = [
        ("/api/ai/analyze-image", json!({ "imageData": "aGk=", "mimeType": "image/png" })),
        ("/api/ai/speech", json!({ "text": "hello", "accent": "us" })),
        ("/api/ai/generate-image", json!({ "prompt": "a red fox" })),
        ("/api/ai/analyze-video", json!({ "url": "https://example.com/v" })),
    ];

    for (path, payload) in cases {
        let (status, body) = post_json(&app, path, payload).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{path}");
        assert_eq!(body["code"], "AI_UNAVAILABLE", "{path}");
    }
}
