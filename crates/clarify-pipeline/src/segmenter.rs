//! Source normalization and slicing.

use std::path::Path;

use tracing::{info, warn};

use clarify_media::{self as media, MediaError};
use clarify_models::{JobId, Segment, StreamLayout};

use crate::error::PipelineResult;

/// What segmentation produced for one source.
#[derive(Debug, Clone)]
pub struct Segmentation {
    /// Staged chunks in index order.
    pub segments: Vec<Segment>,
    /// Original stream layout, restored at reassembly.
    pub layout: StreamLayout,
}

/// Slices a source into fixed-duration mono chunks.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    segment_ms: u64,
}

impl Segmenter {
    pub fn new(segment_ms: u64) -> Self {
        Self { segment_ms }
    }

    /// Normalize and slice `source` into `staging_in`.
    ///
    /// The original channel count and container are captured before the
    /// stream is folded to mono, so reassembly can undo the fold. The
    /// segment count comes from what actually landed in staging, not
    /// from arithmetic on the reported duration.
    pub async fn segment(
        &self,
        job: &JobId,
        source: &Path,
        staging_in: &Path,
    ) -> PipelineResult<Segmentation> {
        if self.segment_ms == 0 {
            return Err(MediaError::invalid_media("segment duration must be positive").into());
        }

        let info = media::probe_media(source).await?;
        let audio = info
            .audio
            .ok_or_else(|| MediaError::NoAudioStream(source.to_path_buf()))?;

        let container = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("wav")
            .to_ascii_lowercase();
        let layout = StreamLayout::new(audio.channels, container);

        let segments = media::segment_audio(source, staging_in, job, self.segment_ms, "wav").await?;

        let estimate = expected_segments(info.duration, self.segment_ms);
        if estimate != 0 && segments.len() != estimate {
            warn!(
                job = %job,
                staged = segments.len(),
                estimate,
                "segment count differs from duration estimate"
            );
        }

        info!(
            job = %job,
            segments = segments.len(),
            channels = layout.channels,
            "source segmented"
        );
        Ok(Segmentation { segments, layout })
    }
}

/// Segments a stream of `duration_secs` splits into at a given window.
fn expected_segments(duration_secs: f64, segment_ms: u64) -> usize {
    if duration_secs <= 0.0 {
        return 0;
    }
    let duration_ms = duration_secs * 1000.0;
    (duration_ms / segment_ms as f64).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_trailing_window_counts() {
        // 20s over a 8s window leaves a 4s remainder chunk.
        assert_eq!(expected_segments(20.0, 8_000), 3);
    }

    #[test]
    fn test_exact_fit_has_no_remainder() {
        assert_eq!(expected_segments(20.0, 10_000), 2);
        assert_eq!(expected_segments(20.0, 5_000), 4);
    }

    #[test]
    fn test_degenerate_durations() {
        assert_eq!(expected_segments(0.0, 8_000), 0);
        assert_eq!(expected_segments(-1.0, 8_000), 0);
        assert_eq!(expected_segments(0.001, 8_000), 1);
    }

    #[tokio::test]
    async fn test_zero_window_is_rejected_before_ffmpeg() {
        let err = Segmenter::new(0)
            .segment(
                &JobId::from_string("j"),
                Path::new("missing.wav"),
                Path::new("/tmp/nowhere"),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("segment duration"));
    }
}
