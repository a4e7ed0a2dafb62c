//! Enhancement engine adapters.
//!
//! The pipeline treats enhancement as an external capability reached
//! one segment at a time. This crate provides:
//! - The [`Enhancer`] seam the dispatcher drives
//! - A subprocess adapter for locally installed engines
//! - An HTTP adapter for remote enhancement services
//! - Environment-driven engine selection

pub mod command;
pub mod config;
pub mod enhancer;
pub mod error;
pub mod http;

pub use command::CommandEnhancer;
pub use config::{EngineConfig, EngineMode};
pub use enhancer::Enhancer;
pub use error::{EngineError, EngineResult};
pub use http::HttpEnhancer;
