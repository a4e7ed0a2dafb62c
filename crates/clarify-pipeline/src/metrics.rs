//! Prometheus metrics for pipeline stages.

use metrics::{counter, histogram};

use clarify_models::{DispatchSummary, MediaKind};

/// Metric names as constants for consistency.
pub mod names {
    // Job metrics
    pub const JOBS_COMPLETED_TOTAL: &str = "clarify_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "clarify_jobs_failed_total";

    // Segment metrics
    pub const SEGMENTS_ENHANCED_TOTAL: &str = "clarify_segments_enhanced_total";
    pub const SEGMENTS_SKIPPED_TOTAL: &str = "clarify_segments_skipped_total";
    pub const SEGMENTS_FAILED_TOTAL: &str = "clarify_segments_failed_total";

    // Stage timing
    pub const STAGE_DURATION_SECONDS: &str = "clarify_stage_duration_seconds";
}

/// Record a job reaching a successful terminal state.
pub fn record_job_completed(kind: MediaKind) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Record a job failing.
pub fn record_job_failed(kind: MediaKind) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Record dispatch counts for one leg of a job.
pub fn record_dispatch(kind: MediaKind, summary: &DispatchSummary) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!(names::SEGMENTS_ENHANCED_TOTAL, &labels).increment(summary.enhanced as u64);
    counter!(names::SEGMENTS_SKIPPED_TOTAL, &labels).increment(summary.skipped as u64);
    counter!(names::SEGMENTS_FAILED_TOTAL, &labels).increment(summary.failed as u64);
}

/// Record how long one pipeline stage took.
pub fn record_stage_duration(stage: &'static str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}
