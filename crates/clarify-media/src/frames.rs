//! Frame extraction and re-encoding for the video pipeline.

use std::path::Path;
use tracing::info;

use clarify_models::{segment as naming, JobId, Segment};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::segment::collect_indexed;

/// Decompose the video stream of `input` into numbered stills under
/// `out_dir`, sampled at `fps`.
///
/// Frames are named `{job}_frame_{i:05}.{ext}`; image2 numbering starts
/// at 1. Returns the staged frames in index order.
pub async fn extract_frames(
    input: &Path,
    out_dir: &Path,
    job: &JobId,
    fps: u32,
    ext: &str,
) -> MediaResult<Vec<Segment>> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let pattern = out_dir.join(naming::frame_pattern(job, ext));
    let cmd = FfmpegCommand::new(input, &pattern).video_filter(format!("fps={fps}"));
    FfmpegRunner::new().run(&cmd).await?;

    let frames = list_frames(out_dir, job).await?;
    if frames.is_empty() {
        return Err(MediaError::invalid_media(format!(
            "frame extraction of {} produced no frames",
            input.display()
        )));
    }

    info!(job = %job, frames = frames.len(), fps, "extracted video frames");
    Ok(frames)
}

/// List a job's staged frames in numeric index order.
pub async fn list_frames(dir: &Path, job: &JobId) -> MediaResult<Vec<Segment>> {
    collect_indexed(dir, job, "_frame_", naming::parse_frame_index).await
}

/// Re-encode a directory of enhanced frames into a video-only stream.
///
/// Reads back the same zero-padded pattern extraction wrote, which is
/// why enhanced counterparts must keep their original file names.
pub async fn encode_frames(
    frames_dir: &Path,
    job: &JobId,
    fps: u32,
    ext: &str,
    output: &Path,
) -> MediaResult<()> {
    let pattern = frames_dir.join(naming::frame_pattern(job, ext));
    let cmd = FfmpegCommand::new(&pattern, output)
        .input_args(["-framerate", &fps.to_string()])
        .video_codec("libx264")
        .pixel_format("yuv420p");
    FfmpegRunner::new().run(&cmd).await
}
