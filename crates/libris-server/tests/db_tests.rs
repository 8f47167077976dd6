//! End-to-end API tests against PostgreSQL
//!
//! Each test gets a fresh database from `#[sqlx::test]` with the workspace
//! migrations applied. They are ignored by default; run them with
//! `DATABASE_URL` set and `--ignored`.

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

use libris_server::{
    api,
    config::{Config, RateLimitConfig, StorageConfig},
    features::FeatureState,
    middleware::rate_limit::SlidingWindowRateLimiter,
    storage::FileStore,
};

const BOUNDARY: &str = "libris-test-boundary";

fn create_test_app(pool: PgPool, dir: &TempDir) -> Router {
    let state = FeatureState {
        db: pool,
        store: FileStore::new(&StorageConfig {
            root: dir.path().to_path_buf(),
            chunk_size: 8,
            ..StorageConfig::default()
        }),
        limiter: Arc::new(SlidingWindowRateLimiter::new(RateLimitConfig {
            quota: 1000,
            window_secs: 60,
        })),
    };
    api::create_router(state, &Config::default().cors)
}

fn request(method: Method, uri: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo("203.0.113.5:41000".parse::<SocketAddr>().unwrap()))
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = request(method, uri).header(header::CONTENT_TYPE, "application/json");
    let body = body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty);
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn upload(app: &Router, house_id: &str, file_name: &str, content: &[u8]) -> (StatusCode, Value) {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n")
            .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let response = app
        .clone()
        .oneshot(
            request(Method::POST, &format!("/api/v1/book-files/{house_id}"))
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create_book(app: &Router, title: &str) -> String {
    let (status, json) = send_json(
        app,
        Method::POST,
        "/api/v1/books",
        Some(json!({ "title": title, "author": "Italo Calvino", "desc": "Cities", "page_count": 165 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["id"].as_str().unwrap().to_string()
}

async fn create_house(app: &Router, book_id: &str, name: &str, lang: &str) -> String {
    let (status, json) = send_json(
        app,
        Method::POST,
        &format!("/api/v1/publishing-houses/{book_id}"),
        Some(json!({ "name": name, "lang": lang })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["id"].as_str().unwrap().to_string()
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_book_crud(pool: PgPool) -> sqlx::Result<()> {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(pool, &dir);

    let id = create_book(&app, "Invisible Cities").await;

    let (status, json) = send_json(&app, Method::GET, &format!("/api/v1/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["description"], "Cities");
    assert_eq!(json["data"]["publishing_houses"], json!([]));

    let (status, json) = send_json(
        &app,
        Method::PUT,
        &format!("/api/v1/books/{id}"),
        Some(json!({ "title": "Le città invisibili" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["title"], "Le città invisibili");
    assert_eq!(json["data"]["page_count"], 165);

    let (status, json) = send_json(&app, Method::GET, "/api/v1/books?per_page=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["meta"]["pagination"]["total"], 1);

    let (status, json) = send_json(&app, Method::DELETE, &format!("/api/v1/books/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["id"], id.as_str());

    let (status, _) = send_json(&app, Method::GET, &format!("/api/v1/books/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_publishing_house_for_missing_book(pool: PgPool) -> sqlx::Result<()> {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(pool, &dir);

    let (status, json) = send_json(
        &app,
        Method::POST,
        &format!("/api/v1/publishing-houses/{}", uuid::Uuid::new_v4()),
        Some(json!({ "name": "Einaudi", "lang": "it" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_move_publishing_house_between_books(pool: PgPool) -> sqlx::Result<()> {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(pool, &dir);

    let first = create_book(&app, "If on a winter's night a traveler").await;
    let second = create_book(&app, "Mr. Palomar").await;
    let house = create_house(&app, &first, "Einaudi", "it").await;

    let (status, json) = send_json(
        &app,
        Method::PUT,
        &format!("/api/v1/publishing-houses/{house}?book_id={second}"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["book_id"], second.as_str());

    let (status, json) = send_json(
        &app,
        Method::PUT,
        &format!("/api/v1/publishing-houses/{house}"),
        Some(json!({ "lang": "en" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["book_id"], second.as_str());
    assert_eq!(json["data"]["lang"], "en");
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_upload_download_and_cascade(pool: PgPool) -> sqlx::Result<()> {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(pool.clone(), &dir);

    let book = create_book(&app, "Cosmicomics").await;
    let house = create_house(&app, &book, "Harcourt", "en").await;

    let content = b"In the beginning there was only a point.".to_vec();
    let (status, json) = upload(&app, &house, "cosmicomics.TXT", &content).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["file_name"], "cosmicomics.TXT");
    assert_eq!(json["data"]["file_type"], "txt");
    assert_eq!(json["data"]["size"], content.len());
    assert_eq!(json["data"]["checksum"].as_str().unwrap().len(), 64);
    assert!(json["data"].get("path").is_none());
    let file_id = json["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(
            request(Method::GET, &format!("/api/v1/book-files/{file_id}/content"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .contains("cosmicomics.TXT"));
    let downloaded = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(downloaded.as_ref(), content.as_slice());

    let (status, json) = send_json(&app, Method::GET, &format!("/api/v1/books/{book}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["publishing_houses"][0]["files"][0]["id"], file_id.as_str());
    assert!(json["data"]["publishing_houses"][0]["files"][0]["size_human"].is_string());

    let (status, json) = send_json(&app, Method::DELETE, &format!("/api/v1/books/{book}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted_files"], 1);

    let files: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM book_files")
        .fetch_one(&pool)
        .await?;
    assert_eq!(files, 0);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    Ok(())
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_upload_to_missing_house_stores_nothing(pool: PgPool) -> sqlx::Result<()> {
    let dir = TempDir::new().unwrap();
    let app = create_test_app(pool, &dir);

    let (status, json) = upload(&app, &uuid::Uuid::new_v4().to_string(), "a.pdf", b"%PDF").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "NOT_FOUND");
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    Ok(())
}
