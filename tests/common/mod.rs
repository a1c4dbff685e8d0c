//! Test helpers for API and concurrency tests.
//!
//! Every helper builds on an in-memory database and a fresh storage root
//! inside a temporary directory.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use depot::web::handlers::AppState;
use depot::web::router::{create_health_router, create_router};
use depot::{Database, ItemRepository, ItemService, ItemStorage};

/// Upload limit used unless a test asks for another one.
pub const DEFAULT_MAX_UPLOAD: usize = 1024 * 1024;

/// A running API backed by a temporary storage root.
pub struct TestApp {
    /// The HTTP test server.
    pub server: TestServer,
    /// Repository sharing the server's database and storage.
    pub repo: ItemRepository,
    /// Keeps the storage root alive for the duration of the test.
    pub temp_dir: TempDir,
}

impl TestApp {
    /// Absolute path of a stored item.
    pub fn disk_path(&self, rel: &str) -> std::path::PathBuf {
        self.temp_dir.path().join(rel)
    }
}

/// Create a repository over an in-memory database and a temporary root.
pub async fn create_test_repo() -> (TempDir, ItemRepository) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let storage = ItemStorage::new(temp_dir.path()).expect("Failed to create storage");
    (temp_dir, ItemRepository::new(db, storage))
}

/// Create a test server with the default upload limit.
pub async fn create_test_app() -> TestApp {
    create_test_app_with_limit(DEFAULT_MAX_UPLOAD).await
}

/// Create a test server with the given upload limit in bytes.
pub async fn create_test_app_with_limit(max_upload: usize) -> TestApp {
    let (temp_dir, repo) = create_test_repo().await;

    let service = ItemService::new(repo.clone(), max_upload);
    let app_state = Arc::new(AppState::new(service));
    let router = create_router(app_state, &[]).merge(create_health_router());

    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        repo,
        temp_dir,
    }
}

/// Multipart form for `POST /upload`.
pub fn upload_form(file_name: &str, content: &[u8], parent_id: Option<&str>) -> MultipartForm {
    let part = Part::bytes(content.to_vec())
        .file_name(file_name)
        .mime_type("application/octet-stream");
    let form = MultipartForm::new().add_part("file", part);
    match parent_id {
        Some(id) => form.add_text("parent_id", id),
        None => form,
    }
}

/// List a folder (`None` for the root) and return the JSON array.
pub async fn list(server: &TestServer, parent_id: Option<&str>) -> Vec<Value> {
    let path = match parent_id {
        Some(id) => format!("/folder/{}", id),
        None => "/folder/".to_string(),
    };
    let response = server.get(&path).await;
    response.assert_status_ok();
    response
        .json::<Value>()
        .as_array()
        .cloned()
        .expect("listing is not an array")
}

/// Find a child by name in a listing.
pub async fn find_child(server: &TestServer, parent_id: Option<&str>, name: &str) -> Option<Value> {
    list(server, parent_id)
        .await
        .into_iter()
        .find(|item| item["name"] == name)
}

/// Create a folder through the API and return its ID.
pub async fn create_folder(server: &TestServer, name: &str, parent_id: Option<&str>) -> String {
    let response = server
        .post("/create")
        .json(&json!({ "name": name, "parent_id": parent_id.unwrap_or("") }))
        .await;
    response.assert_status_ok();

    let item = find_child(server, parent_id, name)
        .await
        .expect("created folder not listed");
    item["id"].as_str().expect("id is not a string").to_string()
}

/// Upload a file through the API and return its ID.
pub async fn upload(
    server: &TestServer,
    file_name: &str,
    content: &[u8],
    parent_id: Option<&str>,
) -> String {
    let response = server
        .post("/upload")
        .multipart(upload_form(file_name, content, parent_id))
        .await;
    response.assert_status_ok();
    response.json::<Value>()["id"]
        .as_str()
        .expect("id is not a string")
        .to_string()
}
