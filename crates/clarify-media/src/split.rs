//! Stream separation for combined containers.

use std::path::Path;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Extract the audio track of `input` into its own file.
///
/// Best-quality VBR, so the enhancement engine sees the cleanest source
/// the container can give.
pub async fn extract_audio(input: &Path, output: &Path) -> MediaResult<()> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(input, output).output_args(["-q:a", "0", "-map", "a"]);
    FfmpegRunner::new().run(&cmd).await
}

/// Extract the video track of `input`, dropping audio, without
/// re-encoding.
pub async fn extract_video(input: &Path, output: &Path) -> MediaResult<()> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    let cmd = FfmpegCommand::new(input, output)
        .no_audio()
        .video_codec("copy");
    FfmpegRunner::new().run(&cmd).await
}
