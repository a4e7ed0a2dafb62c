//! Application state.

use std::sync::Arc;

use clarify_engine::EngineConfig;
use clarify_pipeline::{PipelineConfig, PipelineCoordinator};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub coordinator: Arc<PipelineCoordinator>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Builds the enhancement engines and pipeline coordinator from the
    /// environment and makes sure the staging tree exists.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let engine_config = EngineConfig::from_env();
        let pipeline_config = PipelineConfig::from_env();

        let coordinator = PipelineCoordinator::new(
            pipeline_config,
            engine_config.build_audio(),
            engine_config.build_video(),
        );
        coordinator.layout().ensure_all().await?;

        Ok(Self {
            config,
            coordinator: Arc::new(coordinator),
        })
    }

    /// State wired to an existing coordinator.
    pub fn with_coordinator(config: ApiConfig, coordinator: Arc<PipelineCoordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }
}
