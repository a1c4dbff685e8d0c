//! Item handlers for Web API.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;

use crate::item::{parse_item_id, parse_parent_id};
use crate::web::dto::{
    CreateFolderRequest, DeleteQuery, DriftResponse, ItemResponse, RenameRequest, UploadResponse,
    ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Body of a successful create.
pub const FOLDER_CREATED: &str = "Folder created successfully";

/// Generate a safe Content-Disposition header value for file downloads.
///
/// The plain `filename` parameter is an ASCII fallback with control
/// characters dropped; quotes, backslashes and non-ASCII characters become
/// `_`. Any name that needed changing also gets an RFC 5987 `filename*`.
pub fn content_disposition_header(filename: &str) -> String {
    let needs_encoding = !filename.is_ascii()
        || filename
            .chars()
            .any(|c| c.is_control() || c == '"' || c == '\\');

    if !needs_encoding {
        return format!("attachment; filename=\"{}\"", filename);
    }

    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            c if !c.is_ascii() => '_',
            _ => c,
        })
        .collect();
    let encoded = urlencoding::encode(filename);

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized, encoded
    )
}

/// GET /folder - List the root folder.
pub async fn list_root(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    list(&state, None).await
}

/// GET /folder/:id - List a folder. An empty id lists the root.
pub async fn list_folder(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let parent_id = parse_parent_id(Some(&id))?;
    list(&state, parent_id).await
}

async fn list(state: &AppState, parent_id: Option<i64>) -> Result<Json<Vec<ItemResponse>>, ApiError> {
    let items = state.service.list(parent_id).await?;
    Ok(Json(items.into_iter().map(ItemResponse::from).collect()))
}

/// POST /upload - Upload a file (multipart fields `file` and `parent_id`).
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut filename: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;
    let mut parent_id: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                filename = field.file_name().map(|s| s.to_string());
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| {
                            tracing::warn!("Failed to read file content: {}", e);
                            ApiError::bad_request("Failed to read file")
                        })?
                        .to_vec(),
                );
            }
            "parent_id" => {
                parent_id = Some(field.text().await.map_err(|e| {
                    tracing::warn!("Failed to read parent_id: {}", e);
                    ApiError::bad_request("Invalid parent_id")
                })?);
            }
            _ => {}
        }
    }

    let content = content.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let filename = filename
        .filter(|f| !f.is_empty())
        .ok_or_else(|| ApiError::bad_request("No file name provided"))?;
    let parent_id = parse_parent_id(parent_id.as_deref())?;

    let item = state.service.upload(&content, &filename, parent_id).await?;

    Ok(Json(UploadResponse {
        id: item.id.to_string(),
    }))
}

/// POST /create - Create a folder.
pub async fn create_folder(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateFolderRequest>,
) -> Result<&'static str, ApiError> {
    let parent_id = req.parent_id()?;
    state.service.create_folder(&req.name, parent_id).await?;
    Ok(FOLDER_CREATED)
}

/// PUT /item/:id/rename - Rename an item.
pub async fn rename_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<RenameRequest>,
) -> Result<StatusCode, ApiError> {
    let id = parse_item_id(&id)?;
    state.service.rename(id, &req.name).await?;
    Ok(StatusCode::OK)
}

/// GET /item/:id/download - Download a file.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_item_id(&id)?;
    let (content, name) = state.service.download(id).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, content_disposition_header(&name))
        .header(header::CONTENT_LENGTH, content.len())
        .body(Body::from(content))
        .map_err(|e| {
            tracing::error!("Failed to build response: {}", e);
            ApiError::internal("Failed to build response")
        })
}

/// DELETE /item/:id - Delete an item (`?recursive=true` for non-empty folders).
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    let id = parse_item_id(&id)?;
    state.service.delete(id, query.recursive).await?;
    Ok(StatusCode::OK)
}

/// GET /verify - List records that disagree with the filesystem.
pub async fn verify(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<DriftResponse>>, ApiError> {
    let drift = state.service.verify().await?;
    Ok(Json(drift.into_iter().map(DriftResponse::from).collect()))
}
