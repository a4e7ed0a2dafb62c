//! Engine selection and parameters.

use std::path::PathBuf;
use std::sync::Arc;

use crate::command::CommandEnhancer;
use crate::enhancer::Enhancer;
use crate::http::HttpEnhancer;

/// How engines are invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineMode {
    /// Run a local program per segment
    #[default]
    Command,
    /// Post each segment to a remote service
    Http,
}

impl EngineMode {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "command" => Some(EngineMode::Command),
            "http" => Some(EngineMode::Http),
            _ => None,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Invocation mode, shared by both kinds
    pub mode: EngineMode,
    /// Local engine program (command mode)
    pub program: PathBuf,
    /// Model checkpoint handed to the program
    pub checkpoint: Option<PathBuf>,
    /// Reverse diffusion step count
    pub iterations: u32,
    /// SNR tuning parameter
    pub snr: f64,
    /// Compute device
    pub device: String,
    /// Audio endpoint (http mode)
    pub audio_url: String,
    /// Video endpoint (http mode)
    pub video_url: String,
    /// Per-invocation timeout, if any
    pub invoke_timeout_secs: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Command,
            program: PathBuf::from("enhance-speech"),
            checkpoint: None,
            iterations: 50,
            snr: 0.33,
            device: "cuda".to_string(),
            audio_url: "http://localhost:8080/process_audio".to_string(),
            video_url: "http://localhost:5000/process_video".to_string(),
            invoke_timeout_secs: None,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            mode: std::env::var("ENGINE_MODE")
                .ok()
                .and_then(|s| EngineMode::parse(&s))
                .unwrap_or(defaults.mode),
            program: std::env::var("ENGINE_PROGRAM")
                .map(PathBuf::from)
                .unwrap_or(defaults.program),
            checkpoint: std::env::var("ENGINE_CHECKPOINT").ok().map(PathBuf::from),
            iterations: std::env::var("ENGINE_ITERATIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.iterations),
            snr: std::env::var("ENGINE_SNR")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.snr),
            device: std::env::var("ENGINE_DEVICE").unwrap_or(defaults.device),
            audio_url: std::env::var("ENGINE_AUDIO_URL").unwrap_or(defaults.audio_url),
            video_url: std::env::var("ENGINE_VIDEO_URL").unwrap_or(defaults.video_url),
            invoke_timeout_secs: std::env::var("ENGINE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Build the audio-side enhancer.
    pub fn build_audio(&self) -> Arc<dyn Enhancer> {
        self.build(&self.audio_url)
    }

    /// Build the video-side enhancer.
    pub fn build_video(&self) -> Arc<dyn Enhancer> {
        self.build(&self.video_url)
    }

    fn build(&self, url: &str) -> Arc<dyn Enhancer> {
        match self.mode {
            EngineMode::Command => {
                let mut enhancer = CommandEnhancer::new(&self.program)
                    .with_iterations(self.iterations)
                    .with_snr(self.snr)
                    .with_device(self.device.clone());
                if let Some(ckpt) = &self.checkpoint {
                    enhancer = enhancer.with_checkpoint(ckpt);
                }
                if let Some(secs) = self.invoke_timeout_secs {
                    enhancer = enhancer.with_timeout(secs);
                }
                Arc::new(enhancer)
            }
            EngineMode::Http => Arc::new(HttpEnhancer::new(url)),
        }
    }
}
