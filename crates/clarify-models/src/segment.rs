//! Segment naming, index parsing, and ordering.
//!
//! Staged artifacts carry their sequence position in the file name:
//! `{job}_chunk_{i}.{ext}` for audio slices, `{job}_frame_{i:05}.{ext}`
//! for video frames. The number in the name is the only ordering
//! authority; nothing downstream may sort these names lexically.

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::JobId;

fn chunk_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_chunk_(\d+)\.\w+$").expect("valid chunk regex"))
}

fn frame_index_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_frame_(\d+)\.\w+$").expect("valid frame regex"))
}

/// One staged slice of a job's stream.
///
/// Ordering is by numeric index, never by file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Segment {
    /// Sequence index parsed from the file name.
    pub index: u64,
    /// Staged file backing this segment.
    pub path: PathBuf,
}

impl Segment {
    pub fn new(index: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }

    /// File name of the staged artifact.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// File name for chunk `index` of a job.
pub fn chunk_file_name(job: &JobId, index: u64, ext: &str) -> String {
    format!("{job}_chunk_{index}.{ext}")
}

/// FFmpeg segment-muxer output pattern for a job's chunks.
pub fn chunk_pattern(job: &JobId, ext: &str) -> String {
    format!("{job}_chunk_%d.{ext}")
}

/// FFmpeg image2 output pattern for a job's frames.
///
/// Indices are zero-padded so the same pattern reads the sequence back
/// for re-encoding.
pub fn frame_pattern(job: &JobId, ext: &str) -> String {
    format!("{job}_frame_%05d.{ext}")
}

/// Parse the sequence index from a chunk file name.
///
/// The match anchors at the end of the name, so a job id that itself
/// contains `_chunk_` cannot confuse the parse. Returns `None` for
/// names that are not chunk files.
pub fn parse_chunk_index(file_name: &str) -> Option<u64> {
    chunk_index_re()
        .captures(file_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse the sequence index from a frame file name.
pub fn parse_frame_index(file_name: &str) -> Option<u64> {
    frame_index_re()
        .captures(file_name)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether a staged file name is one of `job`'s segment artifacts.
///
/// Requires the job id as an exact prefix followed by a recognized
/// marker, so sibling jobs sharing a staging directory never count
/// toward each other.
pub fn is_job_artifact(job: &JobId, file_name: &str) -> bool {
    let Some(rest) = file_name.strip_prefix(job.as_str()) else {
        return false;
    };
    (rest.starts_with("_chunk_") && parse_chunk_index(file_name).is_some())
        || (rest.starts_with("_frame_") && parse_frame_index(file_name).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(s: &str) -> JobId {
        JobId::from_string(s)
    }

    #[test]
    fn test_chunk_names_round_trip() {
        let j = job("interview");
        let name = chunk_file_name(&j, 12, "wav");
        assert_eq!(name, "interview_chunk_12.wav");
        assert_eq!(parse_chunk_index(&name), Some(12));
    }

    #[test]
    fn test_numeric_order_beats_lexical_order() {
        let names = [
            "talk_chunk_10.wav",
            "talk_chunk_1.wav",
            "talk_chunk_2.wav",
        ];
        let mut indices: Vec<u64> = names.iter().filter_map(|n| parse_chunk_index(n)).collect();
        indices.sort();
        assert_eq!(indices, vec![1, 2, 10]);

        // Lexical sorting of the same names would yield 1, 10, 2.
        let mut lexical = names.to_vec();
        lexical.sort();
        assert_eq!(lexical[1], "talk_chunk_10.wav");
    }

    #[test]
    fn test_parse_rejects_non_chunk_names() {
        assert_eq!(parse_chunk_index("talk_chunk_.wav"), None);
        assert_eq!(parse_chunk_index("talk_chunk_3"), None);
        assert_eq!(parse_chunk_index("talk_chunk_3.wav.bak"), None);
        assert_eq!(parse_chunk_index("talk_enhanced.wav"), None);
    }

    #[test]
    fn test_parse_anchors_at_name_end() {
        // A job id containing the marker must not shift the parse.
        assert_eq!(parse_chunk_index("weird_chunk_7_chunk_3.wav"), Some(3));
    }

    #[test]
    fn test_frame_names_round_trip() {
        let j = job("clip");
        assert_eq!(frame_pattern(&j, "png"), "clip_frame_%05d.png");
        assert_eq!(parse_frame_index("clip_frame_00042.png"), Some(42));
        assert_eq!(parse_frame_index("clip_frame_x.png"), None);
    }

    #[test]
    fn test_artifact_prefix_discipline() {
        let j = job("take");
        assert!(is_job_artifact(&j, "take_chunk_0.wav"));
        assert!(is_job_artifact(&j, "take_frame_00001.png"));

        // Sibling job with a shared prefix.
        assert!(!is_job_artifact(&j, "take2_chunk_0.wav"));
        // Same job, non-segment artifact.
        assert!(!is_job_artifact(&j, "take_enhanced.wav"));
        // Different job entirely.
        assert!(!is_job_artifact(&j, "other_chunk_0.wav"));
    }
}
