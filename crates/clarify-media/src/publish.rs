//! Publishing finished outputs into their delivery directory.
//!
//! Scratch space and the delivery tree may sit on different
//! filesystems, so a plain rename is not enough.

use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Move a finished file from `src` into place at `dst`.
///
/// Tries a rename first. On EXDEV the file is copied to a `.tmp`
/// sibling of `dst` and renamed into place, so readers of the delivery
/// directory never observe a torn file.
pub async fn publish_file(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> MediaResult<()> {
    let src = src.as_ref();
    let dst = dst.as_ref();

    if let Some(parent) = dst.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent).await?;
        }
    }

    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device_error(&e) => {
            debug!(
                "Cross-device publish, copying: {} -> {}",
                src.display(),
                dst.display()
            );
            copy_into_place(src, dst).await
        }
        Err(e) => Err(MediaError::from(e)),
    }
}

/// EXDEV is error code 18 on Linux/macOS.
fn is_cross_device_error(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(18)
}

async fn copy_into_place(src: &Path, dst: &Path) -> MediaResult<()> {
    let tmp_dst = dst.with_extension("tmp");

    fs::copy(src, &tmp_dst).await?;

    if let Err(e) = fs::rename(&tmp_dst, dst).await {
        let _ = fs::remove_file(&tmp_dst).await;
        return Err(MediaError::from(e));
    }

    // Source removal is best effort; the publish itself already landed.
    if let Err(e) = fs::remove_file(src).await {
        warn!("Could not remove source after publish: {}: {}", src.display(), e);
    }

    Ok(())
}
