//! Router configuration for Web API.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use super::handlers::{
    create_folder, delete_item, download_file, list_folder, list_root, rename_item, upload_file,
    verify, AppState,
};
use super::middleware::create_cors_layer;

/// Room for multipart boundaries and form fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let body_limit = app_state
        .service
        .max_upload_size()
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/folder", get(list_root))
        .route("/folder/", get(list_root))
        .route("/folder/:id", get(list_folder))
        .route("/upload", post(upload_file))
        .route("/create", post(create_folder))
        .route("/item/:id", delete(delete_item))
        .route("/item/:id/rename", put(rename_item))
        .route("/item/:id/download", get(download_file))
        .route("/verify", get(verify))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(create_cors_layer(cors_origins))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(app_state)
}

/// Create a health check router.
pub fn create_health_router() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check handler.
async fn health_check() -> &'static str {
    "OK"
}
