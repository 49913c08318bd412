//! DXFGuard HTTP API
//!
//! A thin axum front-end over the `dxfguard` library. Drawings are uploaded
//! as raw request bodies, analyzed on the blocking pool and kept in an
//! in-memory job store until cleaned up.
//!
//! | Method | Path | |
//! |---|---|---|
//! | `POST` | `/api/analyze?filename=<name>.dxf` | upload and queue an analysis job |
//! | `GET` | `/api/status/:id` | job state and result |
//! | `POST` | `/api/compare` | `{file1_id, file2_id}` of two uploads |
//! | `POST` | `/api/autofix` | `{file_id, create_backup, min_text_height}` |
//! | `GET` | `/api/download/:id?format=json\|markdown\|dxf` | job output |
//! | `DELETE` | `/api/cleanup/:id` | drop a job and its files |
//! | `GET` | `/api/health` | liveness and job count |
//!
//! There is no authentication layer; run it behind a trusted proxy.

pub mod error;
pub mod jobs;
pub mod routes;

use std::path::PathBuf;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use dxfguard::autofix::MIN_TEXT_HEIGHT;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use error::ApiError;
pub use jobs::{Job, JobKind, JobStatus, JobStore};

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub jobs: JobStore,
    /// Uploads, backups and fixed drawings are written here.
    pub upload_dir: PathBuf,
    /// Default for auto-fix requests that do not name one.
    pub min_text_height: f64,
}

impl AppState {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs: JobStore::new(),
            upload_dir: upload_dir.into(),
            min_text_height: MIN_TEXT_HEIGHT,
        }
    }

    pub fn with_min_text_height(mut self, height: f64) -> Self {
        self.min_text_height = height;
        self
    }

    async fn upload_of(&self, id: &Uuid) -> Result<PathBuf, ApiError> {
        self.jobs
            .get(id)
            .await
            .map(|job| job.upload)
            .ok_or(ApiError::JobNotFound)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/api/health", get(routes::health))
        .route("/api/analyze", post(routes::analyze))
        .route("/api/status/:id", get(routes::status))
        .route("/api/compare", post(routes::compare))
        .route("/api/autofix", post(routes::autofix))
        .route("/api/download/:id", get(routes::download))
        .route("/api/cleanup/:id", delete(routes::cleanup))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
