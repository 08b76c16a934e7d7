//! Defines routes for the upload service.
//!
//! ## Structure
//! - `GET  /`        — service info
//! - `POST /upload`  — upload one `.zip` file (multipart field `file`)
//! - `GET  /files`   — list stored `.zip` files
//! - `GET  /healthz` — liveness
//! - `GET  /readyz`  — readiness (storage-directory disk check)

use crate::{
    handlers::{
        file_handlers::{list_files, upload_file},
        health_handlers::{healthz, readyz, service_info},
    },
    services::storage_service::StorageService,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the router for all endpoints.
///
/// The router carries shared state (`StorageService`) to all handlers.
/// The transport-level body limit is lifted on the upload route; the
/// payload cap is enforced while streaming inside `StorageService`, which
/// keeps the size-limit error message uniform.
pub fn routes() -> Router<StorageService> {
    Router::new()
        .route("/", get(service_info))
        // health endpoints
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // file endpoints
        .route(
            "/upload",
            post(upload_file).layer(DefaultBodyLimit::disable()),
        )
        .route("/files", get(list_files))
}
