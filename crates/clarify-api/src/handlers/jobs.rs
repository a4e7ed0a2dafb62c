//! Job status handlers for progress polling.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use tracing::info;

use clarify_models::{DispatchSummary, Job, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// A job as reported over the API.
#[derive(Debug, Serialize)]
pub struct JobView {
    /// Job ID
    pub job_id: String,
    /// Media kind: audio or video
    pub kind: String,
    /// Current state: pending, segmenting, dispatched, complete, reassembled, failed
    pub state: String,
    /// Source file the job was created from
    pub source: String,
    /// Number of segments produced for this job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments_total: Option<usize>,
    /// Per-segment dispatch counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchView>,
    /// Final deliverable path, present once reassembled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message if the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// When the job record was created (RFC3339)
    pub created_at: String,
    /// When the job record was last updated (RFC3339)
    pub updated_at: String,
}

/// Dispatch counts in a job view.
#[derive(Debug, Serialize)]
pub struct DispatchView {
    pub total: usize,
    pub enhanced: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl From<DispatchSummary> for DispatchView {
    fn from(summary: DispatchSummary) -> Self {
        Self {
            total: summary.total,
            enhanced: summary.enhanced,
            skipped: summary.skipped,
            failed: summary.failed,
        }
    }
}

impl JobView {
    pub fn from_job(job: &Job) -> Self {
        Self {
            job_id: job.id.to_string(),
            kind: job.kind.as_str().to_string(),
            state: job.state.as_str().to_string(),
            source: job.source.display().to_string(),
            segments_total: job.segments_total,
            dispatch: job.dispatch.map(DispatchView::from),
            output: job.output.as_ref().map(|p| p.display().to_string()),
            error_message: job.error_message.clone(),
            created_at: job.created_at.to_rfc3339(),
            updated_at: job.updated_at.to_rfc3339(),
        }
    }
}

/// Response for the job list endpoint.
#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobView>,
    pub total: usize,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/jobs
///
/// List all jobs known to this server, newest first.
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<JobListResponse>> {
    let jobs: Vec<JobView> = state
        .coordinator
        .registry()
        .list()
        .await
        .iter()
        .map(JobView::from_job)
        .collect();

    let total = jobs.len();
    Ok(Json(JobListResponse { jobs, total }))
}

/// GET /api/jobs/:job_id
///
/// Get the current status of a single job.
///
/// Returns:
/// - 200: Job status
/// - 404: Job not found
pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobView>> {
    info!(job_id = %job_id, "get_job");

    let id = JobId::from_string(job_id);
    let job = state
        .coordinator
        .registry()
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(JobView::from_job(&job)))
}
