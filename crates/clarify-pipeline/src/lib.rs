//! Stage orchestration for the Clarify enhancement pipeline.
//!
//! A job moves through four stages: the segmenter slices a source into
//! fixed-duration mono chunks, the dispatcher hands each chunk to an
//! enhancement engine (skipping chunks already enhanced), the
//! completion poller watches staging until every enhanced counterpart
//! has landed, and the reassembler stitches the chunks back together
//! in numeric order and restores the original stream layout. The
//! coordinator sequences all of it per job and keeps the records; for
//! combined containers it demuxes first, runs the audio and video legs
//! concurrently, and muxes the results.

pub mod config;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod poller;
pub mod reassembler;
pub mod registry;
pub mod segmenter;

pub use config::PipelineConfig;
pub use coordinator::PipelineCoordinator;
pub use dispatcher::Dispatcher;
pub use error::{PipelineError, PipelineResult};
pub use layout::{KindLayout, StagingLayout};
pub use poller::CompletionPoller;
pub use reassembler::Reassembler;
pub use registry::JobRegistry;
pub use segmenter::{Segmentation, Segmenter};
