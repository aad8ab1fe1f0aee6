//! Shared utilities for integration tests.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;

use plinth::config::AppConfig;
use plinth::files::{DiskStorage, FileStorage};
use plinth::store::{MemoryBackend, StoreHandle, StoreManager};

/// A fully wired test fixture: connected store, disk storage, and a config
/// pointing at a real 404 page. The temp dir must outlive the router.
pub struct TestApp {
    pub config: Arc<AppConfig>,
    pub store: StoreHandle,
    pub files: Arc<dyn FileStorage>,
    pub _dir: TempDir,
}

pub async fn test_app(mut config: AppConfig) -> TestApp {
    let dir = tempfile::tempdir().unwrap();

    let page = dir.path().join("404.html");
    std::fs::write(&page, "<h1>nothing here</h1>").unwrap();
    config.server.not_found_page = page.to_string_lossy().into_owned();
    config.server.file_root = dir.path().join("uploads").to_string_lossy().into_owned();
    config.store.poll_interval_ms = 5;
    config.store.max_connect_attempts = 5;

    let manager = Arc::new(StoreManager::new(
        Arc::new(MemoryBackend::new()),
        config.store.clone(),
    ));
    manager.connect().await.unwrap();
    assert!(manager.await_ready().await.unwrap());

    let files: Arc<dyn FileStorage> =
        Arc::new(DiskStorage::create(&config.server.file_root).unwrap());

    TestApp {
        config: Arc::new(config),
        store: StoreHandle::new(manager),
        files,
        _dir: dir,
    }
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[allow(dead_code)]
pub async fn read_json(response: Response<Body>) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap();
    (status, value)
}

#[allow(dead_code)]
pub async fn read_text(response: Response<Body>) -> (StatusCode, String) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}
