//! Ordered reassembly and layout restoration.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use clarify_media as media;
use clarify_models::{JobId, StreamLayout};

use crate::error::{PipelineError, PipelineResult};

/// Stitches enhanced chunks back into one continuous deliverable.
#[derive(Debug, Clone, Copy, Default)]
pub struct Reassembler;

impl Reassembler {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild the enhanced stream for `job` from `staging_out` into
    /// `output_dir`, restoring the recorded layout.
    ///
    /// Staging is re-listed rather than trusting any in-memory segment
    /// set, and ordering is numeric. A partial stream is refused; extra
    /// chunks beyond `expected` are stale leftovers and are ignored.
    pub async fn reassemble(
        &self,
        job: &JobId,
        layout: &StreamLayout,
        expected: usize,
        staging_out: &Path,
        output_dir: &Path,
    ) -> PipelineResult<PathBuf> {
        let mut chunks = media::list_chunks(staging_out, job).await?;
        if chunks.len() < expected {
            return Err(PipelineError::Incomplete {
                found: chunks.len(),
                expected,
            });
        }
        if chunks.len() > expected {
            warn!(
                job = %job,
                found = chunks.len(),
                expected,
                "ignoring stale chunks beyond the expected count"
            );
            chunks.truncate(expected);
        }

        let parts: Vec<PathBuf> = chunks.iter().map(|s| s.path.clone()).collect();

        let scratch = tempfile::tempdir()?;
        let joined = scratch.path().join(format!("{job}_joined.wav"));
        media::concat_parts(&parts, &joined).await?;

        let restored = scratch
            .path()
            .join(format!("{job}_enhanced.{}", layout.container));
        media::restore_layout(&joined, &restored, layout.channels).await?;

        tokio::fs::create_dir_all(output_dir).await?;
        let target = output_dir.join(format!("{job}_enhanced.{}", layout.container));
        media::publish_file(&restored, &target).await?;

        info!(
            job = %job,
            chunks = expected,
            output = %target.display(),
            "reassembled enhanced stream"
        );
        Ok(target)
    }
}
