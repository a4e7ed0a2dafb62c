//! Ordered concatenation and layout restoration.

use std::path::{Path, PathBuf};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Concatenate `parts` into `output` without re-encoding.
///
/// `parts` must already be in playback order; this function never
/// reorders them. Uses the concat demuxer with a generated list file,
/// so the parts themselves are untouched.
pub async fn concat_parts(parts: &[PathBuf], output: &Path) -> MediaResult<()> {
    if parts.is_empty() {
        return Err(MediaError::invalid_media("no parts to concatenate"));
    }

    // The concat demuxer resolves relative entries against the list
    // file's directory, so entries must be absolute.
    let mut absolute = Vec::with_capacity(parts.len());
    for part in parts {
        absolute.push(tokio::fs::canonicalize(part).await?);
    }

    let scratch = tempfile::tempdir()?;
    let list_path = scratch.path().join("concat.txt");
    tokio::fs::write(&list_path, render_concat_list(&absolute)).await?;

    let cmd = FfmpegCommand::new(&list_path, output)
        .input_args(["-f", "concat", "-safe", "0"])
        .codec_copy();

    FfmpegRunner::new().run(&cmd).await
}

/// Re-expand a mono stream to `channels`, writing the container implied
/// by `output`'s extension.
pub async fn restore_layout(input: &Path, output: &Path, channels: u32) -> MediaResult<()> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    let cmd = FfmpegCommand::new(input, output).audio_channels(channels.max(1));
    FfmpegRunner::new().run(&cmd).await
}

fn render_concat_list(parts: &[PathBuf]) -> String {
    let mut list = String::new();
    for part in parts {
        // Single quotes inside a quoted concat entry are closed, escaped,
        // and reopened.
        let escaped = part.to_string_lossy().replace('\'', r"'\''");
        list.push_str("file '");
        list.push_str(&escaped);
        list.push_str("'\n");
    }
    list
}
