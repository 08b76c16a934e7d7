//! HTTP handlers for uploading and listing files.
//! Streams upload payloads to disk without buffering them in memory and
//! delegates storage concerns to `StorageService`.

use crate::{errors::AppError, services::storage_service::StorageService};
use axum::{
    Json,
    extract::{Multipart, State},
};
use futures::StreamExt;
use serde::Serialize;
use std::io;
use tracing::{info, warn};

/// Multipart field name that carries the payload.
const UPLOAD_FIELD: &str = "file";

/// Response body for `POST /upload`.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub filename: String,
    pub size: u64,
    pub path: String,
}

/// Response body for `GET /files`.
#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub count: usize,
    pub files: Vec<String>,
}

/// Upload one file via the multipart field named `file`.
///
/// The payload is streamed straight into `StorageService::store_file`,
/// which validates the declared name and enforces the size cap while
/// writing. A request without a `file` field fails with 400.
pub async fn upload_file(
    State(service): State<StorageService>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let Some(original_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let stream =
            field.map(|chunk| chunk.map_err(|err| io::Error::new(io::ErrorKind::Other, err)));
        let stored = service.store_file(&original_name, stream).await?;

        info!(
            filename = stored.filename,
            size = stored.size,
            "file uploaded"
        );
        return Ok(Json(UploadResponse {
            message: "File uploaded successfully".into(),
            filename: stored.filename,
            size: stored.size,
            path: stored.path,
        }));
    }

    Err(AppError::bad_request("No file uploaded"))
}

/// List stored files matching the allow-listed extension.
///
/// Names come back sorted lexicographically; see
/// `StorageService::list_files`.
pub async fn list_files(
    State(service): State<StorageService>,
) -> Result<Json<ListFilesResponse>, AppError> {
    let files = service.list_files().await.map_err(|err| {
        warn!("failed to read storage directory: {}", err);
        AppError::internal("Failed to read directory")
    })?;

    Ok(Json(ListFilesResponse {
        count: files.len(),
        files,
    }))
}
