//! Mono-normalizing audio segmentation and chunk listing.

use std::path::Path;
use tracing::info;

use clarify_models::{segment as naming, JobId, Segment};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Slice `input` into fixed-duration mono chunks under `out_dir`.
///
/// Chunks are named `{job}_chunk_{i}.{ext}` with indices assigned by
/// the FFmpeg segment muxer starting at 0. Timestamps are reset per
/// chunk so every chunk stands alone for the engine. Returns the staged
/// chunks in index order.
pub async fn segment_audio(
    input: &Path,
    out_dir: &Path,
    job: &JobId,
    segment_ms: u64,
    ext: &str,
) -> MediaResult<Vec<Segment>> {
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    tokio::fs::create_dir_all(out_dir).await?;

    let pattern = out_dir.join(naming::chunk_pattern(job, ext));
    let segment_time = format!("{:.3}", segment_ms as f64 / 1000.0);

    let cmd = FfmpegCommand::new(input, &pattern)
        .audio_channels(1)
        .output_args(["-f", "segment", "-segment_time", &segment_time])
        .output_args(["-reset_timestamps", "1"]);

    FfmpegRunner::new().run(&cmd).await?;

    let segments = list_chunks(out_dir, job).await?;
    if segments.is_empty() {
        return Err(MediaError::invalid_media(format!(
            "segmentation of {} produced no chunks",
            input.display()
        )));
    }

    info!(job = %job, chunks = segments.len(), "segmented audio into mono chunks");
    Ok(segments)
}

/// List a job's staged chunks in numeric index order.
///
/// Ordering comes from the index parsed out of each file name, never
/// from the names themselves, so `_chunk_10` sorts after `_chunk_2`.
pub async fn list_chunks(dir: &Path, job: &JobId) -> MediaResult<Vec<Segment>> {
    collect_indexed(dir, job, "_chunk_", naming::parse_chunk_index).await
}

/// Collect `{job}{marker}{i}.{ext}` artifacts from a staging directory,
/// sorted by their numeric index.
pub(crate) async fn collect_indexed(
    dir: &Path,
    job: &JobId,
    marker: &str,
    parse: fn(&str) -> Option<u64>,
) -> MediaResult<Vec<Segment>> {
    let prefix = format!("{job}{marker}");
    let mut segments = Vec::new();

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.starts_with(&prefix) {
            continue;
        }
        if let Some(index) = parse(name) {
            segments.push(Segment::new(index, entry.path()));
        }
    }

    segments.sort();
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn touch(dir: &Path, name: &str) {
        tokio::fs::write(dir.join(name), b"x").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_chunks_orders_numerically() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("talk");

        // Written out of order on purpose; index 10 would sort before 2
        // under lexical ordering.
        for name in [
            "talk_chunk_10.wav",
            "talk_chunk_0.wav",
            "talk_chunk_2.wav",
            "talk_chunk_1.wav",
        ] {
            touch(dir.path(), name).await;
        }

        let chunks = list_chunks(dir.path(), &job).await.unwrap();
        let indices: Vec<u64> = chunks.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 10]);
    }

    #[tokio::test]
    async fn test_list_chunks_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("talk");

        touch(dir.path(), "talk_chunk_0.wav").await;
        touch(dir.path(), "talk_enhanced.wav").await;
        touch(dir.path(), "other_chunk_1.wav").await;
        touch(dir.path(), "talk2_chunk_1.wav").await;
        touch(dir.path(), "notes.txt").await;

        let chunks = list_chunks(dir.path(), &job).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
    }

    #[tokio::test]
    async fn test_segment_missing_input_fails_fast() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("ghost");

        let err = segment_audio(
            &dir.path().join("absent.wav"),
            dir.path(),
            &job,
            10_000,
            "wav",
        )
        .await
        .unwrap_err();

        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
