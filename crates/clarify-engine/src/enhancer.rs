//! Enhancement engine abstraction.

use async_trait::async_trait;
use std::path::Path;

use crate::error::EngineResult;

/// One external enhancement capability.
///
/// Implementations either run a local engine process or call a remote
/// service. Either way, a successful return only means the engine
/// accepted the work: the enhanced artifact is observed on the
/// filesystem by the completion poller, never returned here.
#[async_trait]
pub trait Enhancer: Send + Sync {
    /// Enhance one staged segment.
    ///
    /// `input` is the staged segment; `output` is where the enhanced
    /// counterpart is expected to appear, under the same file name.
    /// Remote engines that place output by convention may ignore
    /// `output`.
    async fn enhance(&self, input: &Path, output: &Path) -> EngineResult<()>;

    /// Short label for logs.
    fn label(&self) -> &'static str;
}
