//! Error types for pipeline orchestration.

use std::path::PathBuf;
use thiserror::Error;

use clarify_media::MediaError;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors raised while driving a job through the pipeline.
///
/// Engine invocation failures never appear here directly; the
/// dispatcher folds them into its report and the coordinator decides
/// whether a partial batch is fatal.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no .{ext} sources found in {}", .dir.display())]
    NoInput { dir: PathBuf, ext: String },

    #[error("enhancement failed for {failed}/{total} segments")]
    EnhancementFailed { failed: usize, total: usize },

    #[error("incomplete after timeout: {found}/{expected} segments")]
    DeadlineExpired { found: usize, expected: usize },

    #[error("staging incomplete: {found}/{expected} enhanced segments")]
    Incomplete { found: usize, expected: usize },

    #[error("pipeline cancelled")]
    Cancelled,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// True when the error means "no work", not "work went wrong".
    pub fn is_no_input(&self) -> bool {
        matches!(self, PipelineError::NoInput { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_message_reports_progress() {
        let err = PipelineError::DeadlineExpired {
            found: 2,
            expected: 5,
        };
        assert_eq!(err.to_string(), "incomplete after timeout: 2/5 segments");
    }

    #[test]
    fn test_no_input_names_directory_and_extension() {
        let err = PipelineError::NoInput {
            dir: PathBuf::from("/var/lib/clarify/audio/input"),
            ext: "wav".into(),
        };
        assert!(err.is_no_input());
        assert_eq!(
            err.to_string(),
            "no .wav sources found in /var/lib/clarify/audio/input"
        );
    }
}
