//! FFprobe stream information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Stream-level facts the pipeline needs about a source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Container format name reported by FFprobe
    pub format_name: String,
    /// Whether the file carries a video stream
    pub has_video: bool,
    /// First audio stream, if any
    pub audio: Option<AudioStream>,
}

/// Facts about an audio stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioStream {
    /// Channel count
    pub channels: u32,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Audio codec
    pub codec: String,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
    format_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    channels: Option<u32>,
    sample_rate: Option<String>,
}

/// Probe a media file for stream information.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            "FFprobe failed",
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_probe_output(&output.stdout)
}

/// Get media duration in seconds.
pub async fn get_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let info = probe_media(path).await?;
    Ok(info.duration)
}

/// Get the channel count of the first audio stream.
pub async fn get_channels(path: impl AsRef<Path>) -> MediaResult<u32> {
    let path = path.as_ref();
    let info = probe_media(path).await?;
    info.audio
        .map(|a| a.channels)
        .ok_or_else(|| MediaError::NoAudioStream(path.to_path_buf()))
}

fn parse_probe_output(bytes: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(bytes)?;

    let duration = probe
        .format
        .duration
        .as_ref()
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let has_video = probe.streams.iter().any(|s| s.codec_type == "video");

    let audio = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "audio")
        .map(|s| AudioStream {
            channels: s.channels.unwrap_or(1),
            sample_rate: s
                .sample_rate
                .as_ref()
                .and_then(|r| r.parse().ok())
                .unwrap_or(0),
            codec: s.codec_name.clone().unwrap_or_default(),
        });

    Ok(MediaInfo {
        duration,
        format_name: probe.format.format_name.clone().unwrap_or_default(),
        has_video,
        audio,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEREO_WAV_PROBE: &str = r#"{
        "streams": [
            {
                "codec_type": "audio",
                "codec_name": "pcm_s16le",
                "channels": 2,
                "sample_rate": "48000"
            }
        ],
        "format": {
            "duration": "20.000000",
            "format_name": "wav"
        }
    }"#;

    const MP4_PROBE: &str = r#"{
        "streams": [
            {
                "codec_type": "video",
                "codec_name": "h264"
            },
            {
                "codec_type": "audio",
                "codec_name": "aac",
                "channels": 2,
                "sample_rate": "44100"
            }
        ],
        "format": {
            "duration": "12.5",
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2"
        }
    }"#;

    #[test]
    fn test_parse_audio_only_probe() {
        let info = parse_probe_output(STEREO_WAV_PROBE.as_bytes()).unwrap();
        assert!((info.duration - 20.0).abs() < 0.001);
        assert!(!info.has_video);

        let audio = info.audio.unwrap();
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.sample_rate, 48000);
        assert_eq!(audio.codec, "pcm_s16le");
    }

    #[test]
    fn test_parse_container_probe() {
        let info = parse_probe_output(MP4_PROBE.as_bytes()).unwrap();
        assert!(info.has_video);
        assert_eq!(info.audio.unwrap().channels, 2);
    }

    #[test]
    fn test_parse_probe_without_audio() {
        let json = r#"{"streams": [{"codec_type": "video"}], "format": {}}"#;
        let info = parse_probe_output(json.as_bytes()).unwrap();
        assert!(info.audio.is_none());
        assert_eq!(info.duration, 0.0);
    }
}
