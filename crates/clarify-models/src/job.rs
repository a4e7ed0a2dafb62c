//! Job records and lifecycle states.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::{DispatchSummary, MediaKind};

/// Error deriving a job identifier from a source path.
#[derive(Debug, Error)]
pub enum JobIdError {
    /// The path has no UTF-8 file stem to derive an id from.
    #[error("cannot derive a job id from {0}")]
    UnusableStem(String),
}

/// Identifier for a job, derived from the source file name.
///
/// The same input file always maps to the same id, which is what makes
/// staged artifacts from an interrupted run resumable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Derive an id from a source file path.
    ///
    /// The file stem is sanitized to `[A-Za-z0-9_-]` so the id is safe
    /// to embed in FFmpeg output patterns.
    pub fn from_source_path(path: &Path) -> Result<Self, JobIdError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| JobIdError::UnusableStem(path.display().to_string()))?;

        let cleaned: String = stem
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.is_empty() {
            return Err(JobIdError::UnusableStem(path.display().to_string()));
        }

        Ok(Self(cleaned))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job state in the pipeline.
///
/// Variant order is the pipeline order; later states compare greater so
/// progression can be enforced as forward-only.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job discovered, nothing staged yet
    #[default]
    Pending,
    /// Source is being normalized and sliced
    Segmenting,
    /// Every segment has been handed to the engine
    Dispatched,
    /// All enhanced counterparts observed in staging
    Complete,
    /// Final output assembled and published
    Reassembled,
    /// Job gave up; see `error_message` for the cause
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Segmenting => "segmenting",
            JobState::Dispatched => "dispatched",
            JobState::Complete => "complete",
            JobState::Reassembled => "reassembled",
            JobState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Reassembled | JobState::Failed)
    }
}

/// Source stream properties captured before normalization.
///
/// Segmentation folds everything down to mono; reassembly uses this
/// record to hand back a file shaped like the original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLayout {
    /// Channel count of the original audio stream.
    pub channels: u32,
    /// Container extension of the source file (e.g. "wav", "mp4").
    pub container: String,
}

impl StreamLayout {
    pub fn new(channels: u32, container: impl Into<String>) -> Self {
        Self {
            channels,
            container: container.into(),
        }
    }
}

/// One tracked enhancement run over a single source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Identifier derived from the source file name
    pub id: JobId,

    /// Which pipeline the job runs through
    pub kind: MediaKind,

    /// Source file the job was discovered from
    pub source: PathBuf,

    /// Current lifecycle state
    #[serde(default)]
    pub state: JobState,

    /// Original stream layout, recorded at segmentation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<StreamLayout>,

    /// Number of segments produced by the segmenter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments_total: Option<usize>,

    /// Per-segment dispatch counts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchSummary>,

    /// Final published output, once reassembled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new pending job for a discovered source file.
    pub fn new(id: JobId, kind: MediaKind, source: impl Into<PathBuf>) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            source: source.into(),
            state: JobState::Pending,
            layout: None,
            segments_total: None,
            dispatch: None,
            output: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Move the job forward to `next`.
    ///
    /// Transitions are forward-only: a stale or out-of-order update can
    /// never move the record backwards, and nothing moves past `Failed`.
    /// Failures go through [`Job::fail`], not here.
    pub fn advance(&mut self, next: JobState) {
        if next > self.state {
            self.state = next;
            self.touch();
        }
    }

    /// Add to the job's staged segment count.
    ///
    /// Counts are additive so a combined job can fold both of its legs
    /// into one record.
    pub fn record_segments(&mut self, total: usize) {
        self.segments_total = Some(self.segments_total.unwrap_or(0) + total);
        self.touch();
    }

    /// Record the source stream layout. First writer wins; a combined
    /// job keeps the layout of its original container.
    pub fn record_layout(&mut self, layout: StreamLayout) {
        self.layout.get_or_insert(layout);
        self.touch();
    }

    /// Record dispatch counts, folding into any counts already present.
    pub fn record_dispatch(&mut self, summary: DispatchSummary) {
        self.dispatch = Some(match self.dispatch.take() {
            Some(existing) => existing.merged(summary),
            None => summary,
        });
        self.touch();
    }

    /// Mark the job reassembled with its published output.
    pub fn reassembled(&mut self, output: impl Into<PathBuf>) {
        self.output = Some(output.into());
        self.advance(JobState::Reassembled);
    }

    /// Mark the job failed with a cause.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.state = JobState::Failed;
        self.error_message = Some(error.into());
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_from_path() {
        let id = JobId::from_source_path(Path::new("/data/input/interview take 1.wav")).unwrap();
        assert_eq!(id.as_str(), "interview_take_1");

        let id = JobId::from_source_path(Path::new("clean-cut.mp4")).unwrap();
        assert_eq!(id.as_str(), "clean-cut");
    }

    #[test]
    fn test_job_id_is_stable() {
        let a = JobId::from_source_path(Path::new("a/b/song.wav")).unwrap();
        let b = JobId::from_source_path(Path::new("c/song.wav")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_advance_is_forward_only() {
        let id = JobId::from_string("j1");
        let mut job = Job::new(id, MediaKind::Audio, "in.wav");

        job.advance(JobState::Dispatched);
        assert_eq!(job.state, JobState::Dispatched);

        // A late update from an earlier stage must not regress the record.
        job.advance(JobState::Segmenting);
        assert_eq!(job.state, JobState::Dispatched);

        job.advance(JobState::Complete);
        assert_eq!(job.state, JobState::Complete);
    }

    #[test]
    fn test_failed_is_absorbing() {
        let mut job = Job::new(JobId::from_string("j2"), MediaKind::Audio, "in.wav");
        job.fail("engine unreachable");

        assert_eq!(job.state, JobState::Failed);
        assert!(job.state.is_terminal());

        job.advance(JobState::Reassembled);
        assert_eq!(job.state, JobState::Failed);
    }

    #[test]
    fn test_segment_counts_fold_and_first_layout_wins() {
        let mut job = Job::new(JobId::from_string("j3"), MediaKind::Video, "in.mp4");
        job.record_segments(3);
        job.record_layout(StreamLayout::new(2, "mp4"));
        job.record_segments(100);
        job.record_layout(StreamLayout::new(1, "png"));

        assert_eq!(job.segments_total, Some(103));
        assert_eq!(job.layout.as_ref().unwrap().channels, 2);
    }
}
