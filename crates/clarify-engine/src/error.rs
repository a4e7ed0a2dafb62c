//! Error types for engine invocations.

use thiserror::Error;

/// Result type for engine invocations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while invoking an enhancement engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Engine program not found: {0}")]
    ProgramNotFound(String),

    #[error("Engine invocation failed: {message}")]
    InvocationFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Engine endpoint returned {status}: {detail}")]
    Rejected { status: u16, detail: String },

    #[error("Engine request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Engine timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Create an invocation failure error.
    pub fn invocation_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::InvocationFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }
}
