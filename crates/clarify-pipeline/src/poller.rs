//! Completion detection over the staging tree.
//!
//! Engines never call back; the only completion signal is enhanced
//! artifacts appearing in staging. The poller counts a job's artifacts
//! until the count reaches its target, bounded by a deadline.

use std::path::Path;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info};

use clarify_models::{segment as naming, JobId};

use crate::error::{PipelineError, PipelineResult};

/// Waits for a job's enhanced artifact count to reach its target.
pub struct CompletionPoller {
    interval: Duration,
    deadline: Duration,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl CompletionPoller {
    pub fn new(interval: Duration, deadline: Duration) -> Self {
        Self {
            interval,
            deadline,
            cancel_rx: None,
        }
    }

    /// Attach a cancellation signal, honored between polls.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Block until `expected` artifacts for `job` are staged in `dir`.
    ///
    /// Returns the observed count on success. On expiry the error
    /// reports how far the job got.
    pub async fn await_completion(
        &self,
        dir: &Path,
        job: &JobId,
        expected: usize,
    ) -> PipelineResult<usize> {
        let started = Instant::now();
        let mut cancel_rx = self.cancel_rx.clone();

        loop {
            let found = count_artifacts(dir, job).await?;
            if found >= expected {
                info!(job = %job, found, "all enhanced segments staged");
                return Ok(found);
            }

            if started.elapsed() >= self.deadline {
                return Err(PipelineError::DeadlineExpired { found, expected });
            }

            debug!(job = %job, found, expected, "waiting for enhanced segments");
            self.pause(&mut cancel_rx).await?;
        }
    }

    /// Sleep one interval, waking early on cancellation.
    async fn pause(&self, cancel_rx: &mut Option<watch::Receiver<bool>>) -> PipelineResult<()> {
        let Some(rx) = cancel_rx.as_mut() else {
            tokio::time::sleep(self.interval).await;
            return Ok(());
        };

        if *rx.borrow_and_update() {
            return Err(PipelineError::Cancelled);
        }

        tokio::select! {
            _ = tokio::time::sleep(self.interval) => Ok(()),
            changed = rx.changed() => match changed {
                Ok(()) if *rx.borrow() => Err(PipelineError::Cancelled),
                Ok(()) => Ok(()),
                Err(_) => {
                    // Sender gone; cancellation can no longer arrive.
                    // Finish the pause so the loop never spins.
                    tokio::time::sleep(self.interval).await;
                    Ok(())
                }
            },
        }
    }
}

/// Count staged artifacts belonging to `job` in `dir`.
///
/// Both chunk and frame artifacts count; anything else in the directory
/// (sibling jobs, scratch files) is invisible.
pub async fn count_artifacts(dir: &Path, job: &JobId) -> std::io::Result<usize> {
    let mut count = 0;
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if naming::is_job_artifact(job, name) {
                count += 1;
            }
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fast_poller() -> CompletionPoller {
        CompletionPoller::new(Duration::from_millis(10), Duration::from_secs(5))
    }

    async fn stage(dir: &Path, names: &[&str]) {
        for name in names {
            tokio::fs::write(dir.join(name), b"x").await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_returns_immediately_when_already_complete() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("talk");
        stage(
            dir.path(),
            &["talk_chunk_0.wav", "talk_chunk_1.wav", "talk_chunk_2.wav"],
        )
        .await;

        let found = fast_poller()
            .await_completion(dir.path(), &job, 3)
            .await
            .unwrap();
        assert_eq!(found, 3);
    }

    #[tokio::test]
    async fn test_unblocks_when_artifacts_appear() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("talk");
        stage(dir.path(), &["talk_chunk_0.wav"]).await;

        let dir_path = dir.path().to_path_buf();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            tokio::fs::write(dir_path.join("talk_chunk_1.wav"), b"x")
                .await
                .unwrap();
        });

        let found = fast_poller()
            .await_completion(dir.path(), &job, 2)
            .await
            .unwrap();
        assert_eq!(found, 2);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn test_deadline_reports_progress() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("talk");
        stage(dir.path(), &["talk_chunk_0.wav", "talk_chunk_1.wav"]).await;

        let poller = CompletionPoller::new(Duration::from_millis(10), Duration::from_millis(60));
        let err = poller
            .await_completion(dir.path(), &job, 3)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::DeadlineExpired {
                found: 2,
                expected: 3
            }
        ));
        assert_eq!(err.to_string(), "incomplete after timeout: 2/3 segments");
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_waiting() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("talk");

        let (tx, rx) = watch::channel(false);
        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(true).unwrap();
        });

        let poller = CompletionPoller::new(Duration::from_secs(30), Duration::from_secs(60))
            .with_cancel(rx);
        let err = poller
            .await_completion(dir.path(), &job, 1)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Cancelled));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_artifacts_never_count() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("talk");
        stage(
            dir.path(),
            &[
                "talk2_chunk_0.wav",
                "other_chunk_0.wav",
                "talk_enhanced.wav",
            ],
        )
        .await;

        let poller = CompletionPoller::new(Duration::from_millis(10), Duration::from_millis(40));
        let err = poller
            .await_completion(dir.path(), &job, 1)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::DeadlineExpired {
                found: 0,
                expected: 1
            }
        ));
    }

    #[tokio::test]
    async fn test_counts_frames_for_video_jobs() {
        let dir = TempDir::new().unwrap();
        let job = JobId::from_string("clip");
        stage(
            dir.path(),
            &["clip_frame_00001.png", "clip_frame_00002.png"],
        )
        .await;

        let found = fast_poller()
            .await_completion(dir.path(), &job, 2)
            .await
            .unwrap();
        assert_eq!(found, 2);
    }
}
