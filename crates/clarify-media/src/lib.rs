#![deny(unreachable_patterns)]
//! FFmpeg CLI wrapper for the Clarify enhancement pipeline.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with cancellation support
//! - Stream probing via FFprobe
//! - Mono-normalizing segmentation and numeric-order chunk listing
//! - Frame extraction/re-encoding for the video path
//! - Demux, concat, layout restoration, and remux operations
//! - Cross-device publishing of finished outputs

pub mod command;
pub mod concat;
pub mod error;
pub mod frames;
pub mod mux;
pub mod probe;
pub mod publish;
pub mod segment;
pub mod split;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use concat::{concat_parts, restore_layout};
pub use error::{MediaError, MediaResult};
pub use frames::{encode_frames, extract_frames, list_frames};
pub use mux::mux_streams;
pub use probe::{get_channels, get_duration, probe_media, AudioStream, MediaInfo};
pub use publish::publish_file;
pub use segment::{list_chunks, segment_audio};
pub use split::{extract_audio, extract_video};
