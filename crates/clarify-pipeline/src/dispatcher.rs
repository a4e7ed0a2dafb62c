//! Segment dispatch with resume-aware skipping.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use clarify_engine::Enhancer;
use clarify_models::{DispatchReport, Segment, SegmentDisposition};

use crate::error::{PipelineError, PipelineResult};

/// Hands staged segments to an enhancement engine, one at a time.
///
/// Invocations are strictly sequential; the engine owns the device.
pub struct Dispatcher {
    enhancer: Arc<dyn Enhancer>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Dispatcher {
    pub fn new(enhancer: Arc<dyn Enhancer>) -> Self {
        Self {
            enhancer,
            cancel_rx: None,
        }
    }

    /// Attach a cancellation signal, checked before every invocation.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Dispatch `segments`, skipping any whose enhanced counterpart is
    /// already staged in `staging_out`.
    ///
    /// A failed invocation never aborts the batch. Every segment gets
    /// an outcome; the caller decides what a partial batch means.
    pub async fn dispatch(
        &self,
        segments: &[Segment],
        staging_out: &Path,
    ) -> PipelineResult<DispatchReport> {
        tokio::fs::create_dir_all(staging_out).await?;

        let mut report = DispatchReport::default();

        for segment in segments {
            if self.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let file_name = segment.file_name();
            let target = staging_out.join(&file_name);

            if target.exists() {
                debug!(
                    engine = self.enhancer.label(),
                    file = %file_name,
                    "enhanced counterpart already staged, skipping"
                );
                report.record(segment.index, file_name, SegmentDisposition::Skipped);
                continue;
            }

            match self.enhancer.enhance(&segment.path, &target).await {
                Ok(()) => {
                    debug!(engine = self.enhancer.label(), file = %file_name, "segment dispatched");
                    report.record(segment.index, file_name, SegmentDisposition::Enhanced);
                }
                Err(e) => {
                    warn!(
                        engine = self.enhancer.label(),
                        file = %file_name,
                        "engine invocation failed: {e}"
                    );
                    report.record(
                        segment.index,
                        file_name,
                        SegmentDisposition::Failed(e.to_string()),
                    );
                }
            }
        }

        Ok(report)
    }
}
