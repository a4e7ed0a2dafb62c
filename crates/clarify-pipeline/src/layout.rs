//! Staging tree layout.
//!
//! Every stage reads from and writes to well-known directories under a
//! single root. The tree doubles as the pipeline's resumption ledger:
//! artifacts present on disk at startup are trusted and not redone.

use std::path::{Path, PathBuf};

use clarify_models::MediaKind;

/// The working directories for one media kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindLayout {
    /// Where sources of this kind appear.
    pub input: PathBuf,
    /// Staged segments awaiting enhancement.
    pub staging_in: PathBuf,
    /// Enhanced counterparts, watched by the completion poller.
    pub staging_out: PathBuf,
    /// Reassembled per-kind outputs.
    pub output: PathBuf,
}

impl KindLayout {
    fn under(root: &Path, kind: &str, staged: &str) -> Self {
        let base = root.join(kind);
        Self {
            input: base.join("input"),
            staging_in: base.join(staged),
            staging_out: base.join("enhanced"),
            output: base.join("output"),
        }
    }
}

/// The full staging tree, rooted wherever configuration points it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagingLayout {
    /// Tree root.
    pub root: PathBuf,
    /// Combined containers awaiting the full demux/enhance/mux run.
    pub inbox: PathBuf,
    /// Finished muxed deliverables.
    pub deliverables: PathBuf,
    /// Audio-side directories.
    pub audio: KindLayout,
    /// Video-side directories.
    pub video: KindLayout,
}

impl StagingLayout {
    /// Lay the tree out under `root`.
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            inbox: root.join("input"),
            deliverables: root.join("output"),
            audio: KindLayout::under(&root, "audio", "chunks"),
            video: KindLayout::under(&root, "video", "frames"),
            root,
        }
    }

    /// The directories for one media kind.
    pub fn for_kind(&self, kind: MediaKind) -> &KindLayout {
        match kind {
            MediaKind::Audio => &self.audio,
            MediaKind::Video => &self.video,
        }
    }

    /// Create every directory in the tree.
    pub async fn ensure_all(&self) -> std::io::Result<()> {
        for dir in self.all_dirs() {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(())
    }

    fn all_dirs(&self) -> [&PathBuf; 10] {
        [
            &self.inbox,
            &self.deliverables,
            &self.audio.input,
            &self.audio.staging_in,
            &self.audio.staging_out,
            &self.audio.output,
            &self.video.input,
            &self.video.staging_in,
            &self.video.staging_out,
            &self.video.output,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tree_shape() {
        let layout = StagingLayout::rooted("/data");

        assert_eq!(layout.inbox, PathBuf::from("/data/input"));
        assert_eq!(layout.deliverables, PathBuf::from("/data/output"));
        assert_eq!(layout.audio.input, PathBuf::from("/data/audio/input"));
        assert_eq!(layout.audio.staging_in, PathBuf::from("/data/audio/chunks"));
        assert_eq!(
            layout.audio.staging_out,
            PathBuf::from("/data/audio/enhanced")
        );
        assert_eq!(layout.audio.output, PathBuf::from("/data/audio/output"));
        assert_eq!(layout.video.staging_in, PathBuf::from("/data/video/frames"));
        assert_eq!(
            layout.video.staging_out,
            PathBuf::from("/data/video/enhanced")
        );
    }

    #[test]
    fn test_for_kind() {
        let layout = StagingLayout::rooted("/data");
        assert_eq!(layout.for_kind(MediaKind::Audio), &layout.audio);
        assert_eq!(layout.for_kind(MediaKind::Video), &layout.video);
    }

    #[tokio::test]
    async fn test_ensure_all_creates_every_directory() {
        let root = TempDir::new().unwrap();
        let layout = StagingLayout::rooted(root.path());

        layout.ensure_all().await.unwrap();

        for dir in layout.all_dirs() {
            assert!(dir.is_dir(), "missing {}", dir.display());
        }
    }
}
