//! Request handlers.

use std::path::{Path, PathBuf};

use axum::body::Bytes;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Local;
use dxfguard::report;
use dxfguard::{compare_drawings, parse_drawing, AutoFixReport, AutoFixer, DxfGuardCore, DxfGuardError};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::jobs::{Job, JobKind, JobStatus};
use crate::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "DXFGuard API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "analyze": "/api/analyze",
            "status": "/api/status/{job_id}",
            "compare": "/api/compare",
            "autofix": "/api/autofix",
            "download": "/api/download/{job_id}",
            "cleanup": "/api/cleanup/{job_id}",
            "health": "/api/health"
        }
    }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Local::now().to_rfc3339(),
        "active_jobs": state.jobs.len().await,
    }))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub filename: String,
    #[serde(default = "default_true")]
    pub include_advanced: bool,
}

fn default_true() -> bool {
    true
}

/// Store the uploaded body and analyze it in the background.
pub async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !params.filename.to_lowercase().ends_with(".dxf") {
        return Err(ApiError::BadRequest("Only DXF files are supported".to_string()));
    }
    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty upload".to_string()));
    }

    let id = Uuid::new_v4();
    let upload = state.upload_dir.join(format!("{}.dxf", id));
    tokio::fs::write(&upload, &body).await?;
    state
        .jobs
        .insert(Job::new(id, JobKind::Analysis, &params.filename, upload.clone()))
        .await;
    info!("Analysis job {} started for {}", id, params.filename);

    let jobs = state.jobs.clone();
    let include_advanced = params.include_advanced;
    tokio::spawn(async move {
        let outcome =
            tokio::task::spawn_blocking(move || run_analysis(&upload, include_advanced)).await;
        let updated = jobs
            .update(&id, |job| match outcome {
                Ok(Ok((result, report))) => job.complete(result, report),
                Ok(Err(e)) => job.fail(e.to_string()),
                Err(e) => job.fail(e.to_string()),
            })
            .await;
        if !updated {
            warn!("Job {} was removed before analysis finished", id);
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "job_id": id,
            "status": JobStatus::Processing,
            "message": "Analysis started",
        })),
    ))
}

fn run_analysis(path: &Path, include_advanced: bool) -> Result<(Value, String), DxfGuardError> {
    let result = DxfGuardCore::analyze_file(path)?;
    if include_advanced {
        let report = report::advanced_report(&result.drawing, &result.advanced, &result.three_d);
        Ok((serde_json::to_value(&result)?, report))
    } else {
        let report = report::basic_report(&result.drawing);
        let value = json!({
            "drawing": result.drawing,
            "three_d": result.three_d,
        });
        Ok((value, report))
    }
}

pub async fn status(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Job>, ApiError> {
    state.jobs.get(&id).await.map(Json).ok_or(ApiError::JobNotFound)
}

#[derive(Debug, Deserialize)]
pub struct CompareRequest {
    pub file1_id: Uuid,
    pub file2_id: Uuid,
}

/// Compare the uploads of two earlier jobs.
pub async fn compare(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Result<Json<Value>, ApiError> {
    let old = state.upload_of(&request.file1_id).await?;
    let new = state.upload_of(&request.file2_id).await?;

    let result = tokio::task::spawn_blocking(move || -> Result<_, DxfGuardError> {
        Ok(compare_drawings(&parse_drawing(&old)?, &parse_drawing(&new)?))
    })
    .await??;
    let markdown = report::comparison_report(&result);

    Ok(Json(json!({
        "status": JobStatus::Completed,
        "differences": result,
        "report": markdown,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AutoFixRequest {
    pub file_id: Uuid,
    #[serde(default = "default_true")]
    pub create_backup: bool,
    pub min_text_height: Option<f64>,
}

/// Repair the upload of an earlier job into a new downloadable job.
pub async fn autofix(
    State(state): State<AppState>,
    Json(request): Json<AutoFixRequest>,
) -> Result<Json<Value>, ApiError> {
    let source = state.upload_of(&request.file_id).await?;
    let id = Uuid::new_v4();
    let output = state.upload_dir.join(format!("{}_fixed.dxf", id));
    let min_text_height = request.min_text_height.unwrap_or(state.min_text_height);

    let fix_report = {
        let source = source.clone();
        let output = output.clone();
        let backup = request.create_backup;
        tokio::task::spawn_blocking(move || run_autofix(&source, &output, backup, min_text_height))
            .await??
    };

    let mut job = Job::new(id, JobKind::AutoFix, format!("fixed_{}.dxf", request.file_id), source);
    job.output = Some(output);
    job.complete(
        serde_json::to_value(&fix_report).map_err(DxfGuardError::from)?,
        report::autofix_report(&fix_report),
    );
    state.jobs.insert(job).await;
    info!(
        "Auto-fix job {} applied {} fixes to {}",
        id, fix_report.summary.total_fixes, request.file_id
    );

    Ok(Json(json!({
        "job_id": id,
        "status": JobStatus::Completed,
        "result": fix_report,
    })))
}

fn run_autofix(
    source: &Path,
    output: &Path,
    backup: bool,
    min_text_height: f64,
) -> Result<AutoFixReport, DxfGuardError> {
    let mut fixer = AutoFixer::load(source)?.with_min_text_height(min_text_height);
    if backup {
        fixer.create_backup(source)?;
    }
    let fix_report = fixer.fix_with_analysis();
    fixer.save(output)?;
    Ok(fix_report)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadFormat {
    #[default]
    Json,
    Markdown,
    Dxf,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    #[serde(default)]
    pub format: DownloadFormat,
}

pub async fn download(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let job = state.jobs.get(&id).await.ok_or(ApiError::JobNotFound)?;
    if job.status != JobStatus::Completed {
        return Err(ApiError::NotCompleted);
    }

    match params.format {
        DownloadFormat::Json => Ok(Json(job.result.unwrap_or(Value::Null)).into_response()),
        DownloadFormat::Markdown => Ok(attachment(
            "text/markdown; charset=utf-8",
            &format!("analysis_report_{}.md", id),
            job.report.unwrap_or_default().into_bytes(),
        )),
        DownloadFormat::Dxf => {
            let Some(output) = job.output else {
                return Err(ApiError::BadRequest("No DXF output for this job".to_string()));
            };
            let bytes = tokio::fs::read(&output).await?;
            Ok(attachment("application/dxf", &format!("fixed_{}.dxf", id), bytes))
        }
    }
}

fn attachment(content_type: &str, filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}

/// Drop the job and every file named after it.
pub async fn cleanup(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<Uuid>,
) -> Result<Json<Value>, ApiError> {
    state.jobs.remove(&id).await.ok_or(ApiError::JobNotFound)?;
    let removed = remove_job_files(&state.upload_dir, &id).await?;
    info!("Cleaned up job {} ({} files)", id, removed.len());
    Ok(Json(json!({ "message": "Job cleaned up successfully" })))
}

async fn remove_job_files(dir: &Path, id: &Uuid) -> std::io::Result<Vec<PathBuf>> {
    let prefix = id.to_string();
    let mut removed = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            tokio::fs::remove_file(entry.path()).await?;
            removed.push(entry.path());
        }
    }
    Ok(removed)
}
