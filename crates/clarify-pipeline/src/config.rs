//! Pipeline configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Tunables for the enhancement pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root of the staging tree.
    pub media_root: PathBuf,
    /// Fixed slice duration for audio segmentation, in milliseconds.
    pub segment_ms: u64,
    /// Delay between completion polls.
    pub poll_interval: Duration,
    /// How long the poller waits before declaring a job stuck.
    pub poll_deadline: Duration,
    /// Sampling rate for video frame extraction, frames per second.
    pub frame_rate: u32,
    /// Extension of eligible audio inbox sources.
    pub audio_input_ext: String,
    /// Extension of eligible combined container sources.
    pub container_input_ext: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("/var/lib/clarify"),
            segment_ms: 10_000,
            poll_interval: Duration::from_secs(2),
            poll_deadline: Duration::from_secs(600),
            frame_rate: 25,
            audio_input_ext: "wav".to_string(),
            container_input_ext: "mp4".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            media_root: std::env::var("MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.media_root),
            segment_ms: std::env::var("SEGMENT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.segment_ms),
            poll_interval: std::env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_interval),
            poll_deadline: std::env::var("POLL_DEADLINE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.poll_deadline),
            frame_rate: std::env::var("FRAME_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.frame_rate),
            audio_input_ext: std::env::var("AUDIO_INPUT_EXT").unwrap_or(defaults.audio_input_ext),
            container_input_ext: std::env::var("CONTAINER_INPUT_EXT")
                .unwrap_or(defaults.container_input_ext),
        }
    }
}
