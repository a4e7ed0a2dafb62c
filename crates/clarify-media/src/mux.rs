//! Remuxing enhanced streams into a delivery container.

use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Combine an enhanced video-only stream and an enhanced audio stream
/// into one container.
///
/// The video stream is copied as-is; audio is encoded to AAC for
/// container compatibility. Built as a raw command because the builder
/// handles exactly one input.
pub async fn mux_streams(video: &Path, audio: &Path, output: &Path) -> MediaResult<()> {
    for path in [video, audio] {
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
    }
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-y", "-v", "error", "-i"])
        .arg(video)
        .arg("-i")
        .arg(audio)
        .args(["-map", "0:v:0", "-map", "1:a:0", "-c:v", "copy", "-c:a", "aac"])
        .arg(output)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    debug!(
        "Muxing {} + {} -> {}",
        video.display(),
        audio.display(),
        output.display()
    );

    let result = cmd.output().await?;
    if !result.status.success() {
        return Err(MediaError::ffmpeg_failed(
            "FFmpeg mux exited with non-zero status",
            Some(String::from_utf8_lossy(&result.stderr).to_string()),
            result.status.code(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_mux_missing_track_fails_fast() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("v.mp4");
        tokio::fs::write(&video, b"x").await.unwrap();

        let err = mux_streams(
            &video,
            &dir.path().join("absent.wav"),
            &dir.path().join("out.mp4"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
