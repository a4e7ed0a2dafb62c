//! Inbox processing handlers.
//!
//! Each POST sweeps the corresponding staging inbox and runs every
//! discovered file as its own job, start to finish. The response reports
//! per-job outcomes; failed jobs stay queryable under /api/jobs.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use tracing::info;

use clarify_models::{Job, JobState};

use crate::error::{ApiError, ApiResult};
use crate::handlers::jobs::JobView;
use crate::state::AppState;

/// Response for an inbox sweep.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// "complete" when every job succeeded, "partial" otherwise
    pub status: String,
    /// Jobs that finished with a deliverable
    pub processed: usize,
    /// Jobs that ended in the failed state
    pub failed: usize,
    /// Per-job outcomes, in discovery order
    pub jobs: Vec<JobView>,
}

/// POST /api/process/audio
///
/// Sweep the audio inbox and enhance every source file found there.
///
/// Returns:
/// - 200: At least one job produced a deliverable
/// - 404: No source files in the inbox
/// - 500: Every discovered job failed
pub async fn process_audio(State(state): State<AppState>) -> ApiResult<Json<ProcessResponse>> {
    info!("audio inbox sweep requested");
    let jobs = state.coordinator.process_audio_inbox().await?;
    finish_sweep(jobs)
}

/// POST /api/process/media
///
/// Sweep the media inbox and enhance every audio+video container found
/// there. Each container is demuxed, both legs are enhanced, and the
/// result is muxed back together.
///
/// Returns:
/// - 200: At least one job produced a deliverable
/// - 404: No source files in the inbox
/// - 500: Every discovered job failed
pub async fn process_media(State(state): State<AppState>) -> ApiResult<Json<ProcessResponse>> {
    info!("media inbox sweep requested");
    let jobs = state.coordinator.process_container_inbox().await?;
    finish_sweep(jobs)
}

fn finish_sweep(jobs: Vec<Job>) -> ApiResult<Json<ProcessResponse>> {
    let failed = jobs.iter().filter(|j| j.state == JobState::Failed).count();
    let processed = jobs.len() - failed;

    if processed == 0 && failed > 0 {
        // Every discovered file failed; surface the first cause.
        let detail = jobs
            .iter()
            .find_map(|j| j.error_message.clone())
            .unwrap_or_else(|| "enhancement failed".to_string());
        return Err(ApiError::internal(format!(
            "all {} jobs failed: {}",
            failed, detail
        )));
    }

    let status = if failed == 0 { "complete" } else { "partial" };
    let views: Vec<JobView> = jobs.iter().map(JobView::from_job).collect();

    info!(processed, failed, "inbox sweep finished");

    Ok(Json(ProcessResponse {
        status: status.to_string(),
        processed,
        failed,
        jobs: views,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clarify_models::{JobId, MediaKind};
    use std::path::PathBuf;

    fn job(id: &str, failed: bool) -> Job {
        let mut job = Job::new(
            JobId::from_string(id),
            MediaKind::Audio,
            PathBuf::from(format!("/tmp/{}.wav", id)),
        );
        if failed {
            job.fail("boom");
        } else {
            job.reassembled(PathBuf::from(format!("/tmp/out/{}_enhanced.wav", id)));
        }
        job
    }

    #[test]
    fn test_all_succeeded_is_complete() {
        let response = finish_sweep(vec![job("a", false), job("b", false)]).unwrap();
        assert_eq!(response.status, "complete");
        assert_eq!(response.processed, 2);
        assert_eq!(response.failed, 0);
    }

    #[test]
    fn test_mixed_outcome_is_partial() {
        let response = finish_sweep(vec![job("a", false), job("b", true)]).unwrap();
        assert_eq!(response.status, "partial");
        assert_eq!(response.processed, 1);
        assert_eq!(response.failed, 1);
    }

    #[test]
    fn test_all_failed_is_error() {
        let err = finish_sweep(vec![job("a", true), job("b", true)]).unwrap_err();
        assert!(err.to_string().contains("all 2 jobs failed"));
        assert!(err.to_string().contains("boom"));
    }
}
