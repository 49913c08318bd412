//! In-memory job store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Analysis,
    AutoFix,
}

#[derive(Debug, Clone, Serialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: Uuid,
    pub kind: JobKind,
    pub filename: String,
    pub status: JobStatus,
    pub created_at: DateTime<Local>,
    pub completed_at: Option<DateTime<Local>>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    /// Uploaded drawing on disk.
    #[serde(skip)]
    pub upload: PathBuf,
    /// Markdown rendering of `result`.
    #[serde(skip)]
    pub report: Option<String>,
    /// Repaired drawing written by an auto-fix job.
    #[serde(skip)]
    pub output: Option<PathBuf>,
}

impl Job {
    pub fn new(id: Uuid, kind: JobKind, filename: impl Into<String>, upload: PathBuf) -> Self {
        Self {
            id,
            kind,
            filename: filename.into(),
            status: JobStatus::Processing,
            created_at: Local::now(),
            completed_at: None,
            result: None,
            error: None,
            upload,
            report: None,
            output: None,
        }
    }

    pub fn complete(&mut self, result: serde_json::Value, report: String) {
        self.status = JobStatus::Completed;
        self.completed_at = Some(Local::now());
        self.result = Some(result);
        self.report = Some(report);
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.completed_at = Some(Local::now());
        self.error = Some(error.into());
    }
}

#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, Job>>>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id, job);
    }

    pub async fn get(&self, id: &Uuid) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Apply `f` to the job. Returns false when the job is gone.
    pub async fn update<F: FnOnce(&mut Job)>(&self, id: &Uuid, f: F) -> bool {
        match self.jobs.write().await.get_mut(id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, id: &Uuid) -> Option<Job> {
        self.jobs.write().await.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
