use super::*;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use std::io::{Cursor, Read};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Router over a fresh temp store
fn test_app() -> (Router, FileStore, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path());
    let orchestrator = BatchOrchestrator::builder(store.clone()).build().unwrap();
    let app = create_router(
        AppState::new(Arc::new(orchestrator)),
        &["http://localhost:3000".to_string()],
    );
    (app, store, dir)
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn zip_names(bytes: Vec<u8>) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let (app, _store, _dir) = test_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_crawl_rejects_empty_urls() {
    let (app, _store, _dir) = test_app();
    let response = app
        .oneshot(post_json("/api/crawl", json!({"urls": []})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_crawl_rejects_bad_scheme() {
    let (app, _store, _dir) = test_app();
    let response = app
        .oneshot(post_json("/api/crawl", json!({"urls": ["ftp://example.com/x"]})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_crawl_rejects_malformed_json() {
    let (app, _store, _dir) = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/api/crawl")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "validation_error");
}

#[tokio::test]
async fn test_crawl_then_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<html><body><a href="/x">Link</a> text</body></html>"#, "text/html"),
        )
        .mount(&server)
        .await;

    let (app, _store, _dir) = test_app();
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/crawl",
            json!({
                "urls": [format!("{}/page", server.uri()), format!("{}/missing", server.uri())],
                "exclude_links": true
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let report = body_json(response).await;
    assert_eq!(report["status"], "success");
    assert_eq!(report["files"][0]["filename"], "page.md");
    assert_eq!(report["files"][0]["outcome"], "succeeded");
    assert_eq!(report["files"][1]["outcome"], "failed");
    assert_eq!(report["files"][1]["error"], "HTTP error: 404");
    assert_eq!(report["message"], "Successfully processed 1 of 2 URLs");

    let response = app.oneshot(get("/api/download/page")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"page.md\""
    );
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/markdown"));
    assert_eq!(body_bytes(response).await, b"Link text");
}

#[tokio::test]
async fn test_download_with_extension() {
    let (app, store, _dir) = test_app();
    store.put("notes.md", "# Notes").await.unwrap();

    let response = app.oneshot(get("/api/download/notes.md")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"# Notes");
}

#[tokio::test]
async fn test_download_unknown_is_404() {
    let (app, _store, _dir) = test_app();
    let response = app.oneshot(get("/api/download/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["error"]["message"], "File not found: nope.md");
}

#[tokio::test]
async fn test_download_invalid_name_is_400() {
    let (app, _store, _dir) = test_app();
    let response = app.oneshot(get("/api/download/.env")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (app, _store, _dir) = test_app();
    let response = app
        .oneshot(get("/api/download/..%2Fsecret"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bulk_download_empty_store() {
    let (app, _store, _dir) = test_app();
    let response = app.oneshot(get("/api/download/bulk")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "empty_archive");
}

#[tokio::test]
async fn test_bulk_download_all() {
    let (app, store, _dir) = test_app();
    store.put("b.md", "B").await.unwrap();
    store.put("a.md", "A").await.unwrap();

    let response = app.oneshot(get("/api/download/bulk")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"bulk_download_"));
    assert!(disposition.ends_with(".zip\""));

    assert_eq!(zip_names(body_bytes(response).await), vec!["a.md", "b.md"]);
}

#[tokio::test]
async fn test_bulk_download_selected() {
    let (app, store, _dir) = test_app();
    for name in ["a.md", "b.md", "c.md"] {
        store.put(name, name).await.unwrap();
    }

    let response = app
        .clone()
        .oneshot(post_json("/api/download/bulk", json!(["c", "a.md"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(zip_names(body_bytes(response).await), vec!["a.md", "c.md"]);

    let response = app
        .oneshot(post_json("/api/download/bulk", json!(["a.md", "zzz.md"])))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_list_files() {
    let (app, store, _dir) = test_app();
    store.put("one.md", "123").await.unwrap();

    let response = app.oneshot(get("/api/files")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let files = body_json(response).await;
    assert_eq!(files[0]["filename"], "one.md");
    assert_eq!(files[0]["size"], 3);
    assert!(files[0]["created_at"].is_string());
}

#[tokio::test]
async fn test_schema() {
    let (app, _store, _dir) = test_app();
    let response = app.oneshot(get("/api/schema")).await.unwrap();
    let schema = body_json(response).await;
    assert!(schema["request"]["properties"]["urls"].is_object());
    assert!(schema["report"]["properties"]["files"].is_object());
}

#[tokio::test]
async fn test_cors_allowed_origin() {
    let (app, _store, _dir) = test_app();
    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );
}

#[test]
fn test_cors_any_origin() {
    // Building must not panic for either form
    let _ = build_cors_layer(&["*".to_string()]);
    let _ = build_cors_layer(&[]);
}
