//! Shared data models for the Clarify enhancement pipeline.
//!
//! This crate provides the types every stage agrees on:
//! - Jobs, lifecycle states, and stream layouts
//! - Segment naming and numeric-index parsing
//! - Per-segment dispatch outcomes

pub mod job;
pub mod kind;
pub mod report;
pub mod segment;

// Re-export common types
pub use job::{Job, JobId, JobIdError, JobState, StreamLayout};
pub use kind::MediaKind;
pub use report::{DispatchReport, DispatchSummary, SegmentDisposition, SegmentOutcome};
pub use segment::Segment;
