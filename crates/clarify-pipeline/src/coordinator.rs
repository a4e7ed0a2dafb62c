//! Pipeline sequencing and job lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use clarify_engine::Enhancer;
use clarify_media as media;
use clarify_models::{DispatchReport, Job, JobId, JobState, MediaKind, SegmentDisposition};

use crate::config::PipelineConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{PipelineError, PipelineResult};
use crate::layout::StagingLayout;
use crate::metrics;
use crate::poller::CompletionPoller;
use crate::reassembler::Reassembler;
use crate::registry::JobRegistry;
use crate::segmenter::Segmenter;

const FRAME_EXT: &str = "png";

/// Drives every stage for each discovered source and owns the job
/// records.
///
/// Jobs run one after another. Inside a combined job the audio and
/// video legs run concurrently and join before the mux; the legs share
/// only the job record, which tolerates concurrent forward-only
/// updates.
pub struct PipelineCoordinator {
    config: PipelineConfig,
    layout: StagingLayout,
    audio_engine: Arc<dyn Enhancer>,
    video_engine: Arc<dyn Enhancer>,
    registry: Arc<JobRegistry>,
    shutdown_tx: watch::Sender<bool>,
}

impl PipelineCoordinator {
    pub fn new(
        config: PipelineConfig,
        audio_engine: Arc<dyn Enhancer>,
        video_engine: Arc<dyn Enhancer>,
    ) -> Self {
        let layout = StagingLayout::rooted(&config.media_root);
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            layout,
            audio_engine,
            video_engine,
            registry: Arc::new(JobRegistry::new()),
            shutdown_tx,
        }
    }

    /// Shared job records.
    pub fn registry(&self) -> Arc<JobRegistry> {
        Arc::clone(&self.registry)
    }

    /// The staging tree this coordinator works in.
    pub fn layout(&self) -> &StagingLayout {
        &self.layout
    }

    /// Ask in-flight stages to stop at the next safe point.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn cancel_rx(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// Run the audio pipeline over everything in the audio inbox.
    ///
    /// Every eligible file becomes its own job; one job failing never
    /// stops the rest. Errors only surface when the inbox itself is
    /// unusable.
    pub async fn process_audio_inbox(&self) -> PipelineResult<Vec<Job>> {
        self.layout.ensure_all().await?;
        let sources = self
            .discover(&self.layout.audio.input, &self.config.audio_input_ext)
            .await?;
        info!(count = sources.len(), "processing audio inbox");

        let mut jobs = Vec::with_capacity(sources.len());
        for (id, source) in sources {
            jobs.push(self.run_audio_job(id, source).await);
        }
        Ok(jobs)
    }

    /// Run the combined pipeline over everything in the container inbox.
    pub async fn process_container_inbox(&self) -> PipelineResult<Vec<Job>> {
        self.layout.ensure_all().await?;
        let sources = self
            .discover(&self.layout.inbox, &self.config.container_input_ext)
            .await?;
        info!(count = sources.len(), "processing container inbox");

        let mut jobs = Vec::with_capacity(sources.len());
        for (id, source) in sources {
            jobs.push(self.run_container_job(id, source).await);
        }
        Ok(jobs)
    }

    /// Find eligible sources in `dir`: every regular file carrying the
    /// expected extension, in name order. Files whose names cannot
    /// yield a job id are skipped with a warning.
    async fn discover(&self, dir: &Path, ext: &str) -> PipelineResult<Vec<(JobId, PathBuf)>> {
        let mut sources = Vec::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let name = entry.file_name();
            if name.to_string_lossy().starts_with('.') {
                continue;
            }
            let eligible = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ext));
            if !eligible {
                continue;
            }
            match JobId::from_source_path(&path) {
                Ok(id) => sources.push((id, path)),
                Err(e) => warn!("skipping source {}: {e}", path.display()),
            }
        }
        sources.sort_by(|a, b| a.1.cmp(&b.1));

        if sources.is_empty() {
            return Err(PipelineError::NoInput {
                dir: dir.to_path_buf(),
                ext: ext.to_string(),
            });
        }
        Ok(sources)
    }

    async fn run_audio_job(&self, id: JobId, source: PathBuf) -> Job {
        self.registry
            .upsert(Job::new(id.clone(), MediaKind::Audio, &source))
            .await;
        info!(job = %id, source = %source.display(), "audio job started");

        let started = Instant::now();
        let record = match self.audio_leg(&id, &source).await {
            Ok(output) => {
                metrics::record_job_completed(MediaKind::Audio);
                info!(
                    job = %id,
                    output = %output.display(),
                    elapsed_secs = started.elapsed().as_secs(),
                    "audio job finished"
                );
                self.registry.update(&id, |j| j.reassembled(&output)).await
            }
            Err(e) => {
                metrics::record_job_failed(MediaKind::Audio);
                error!(job = %id, "audio job failed: {e}");
                self.registry.update(&id, |j| j.fail(e.to_string())).await
            }
        };
        record.expect("job inserted at start of run")
    }

    async fn run_container_job(&self, id: JobId, source: PathBuf) -> Job {
        self.registry
            .upsert(Job::new(id.clone(), MediaKind::Video, &source))
            .await;
        info!(job = %id, source = %source.display(), "container job started");

        let started = Instant::now();
        let record = match self.container_legs(&id, &source).await {
            Ok(output) => {
                metrics::record_job_completed(MediaKind::Video);
                info!(
                    job = %id,
                    output = %output.display(),
                    elapsed_secs = started.elapsed().as_secs(),
                    "container job finished"
                );
                self.registry.update(&id, |j| j.reassembled(&output)).await
            }
            Err(e) => {
                metrics::record_job_failed(MediaKind::Video);
                error!(job = %id, "container job failed: {e}");
                self.registry.update(&id, |j| j.fail(e.to_string())).await
            }
        };
        self.cleanup_demuxed(&id).await;
        record.expect("job inserted at start of run")
    }

    /// Segment, dispatch, poll, reassemble one audio stream.
    async fn audio_leg(&self, id: &JobId, source: &Path) -> PipelineResult<PathBuf> {
        if self.is_shutting_down() {
            return Err(PipelineError::Cancelled);
        }
        let dirs = &self.layout.audio;

        self.registry
            .update(id, |j| j.advance(JobState::Segmenting))
            .await;
        let stage = Instant::now();
        let segmentation = Segmenter::new(self.config.segment_ms)
            .segment(id, source, &dirs.staging_in)
            .await?;
        metrics::record_stage_duration("segment", stage.elapsed().as_secs_f64());

        let total = segmentation.segments.len();
        self.registry
            .update(id, |j| {
                j.record_segments(total);
                j.record_layout(segmentation.layout.clone());
            })
            .await;

        let stage = Instant::now();
        let report = Dispatcher::new(Arc::clone(&self.audio_engine))
            .with_cancel(self.cancel_rx())
            .dispatch(&segmentation.segments, &dirs.staging_out)
            .await?;
        metrics::record_stage_duration("dispatch", stage.elapsed().as_secs_f64());
        metrics::record_dispatch(MediaKind::Audio, &report.summary());
        self.registry
            .update(id, |j| {
                j.record_dispatch(report.summary());
                j.advance(JobState::Dispatched);
            })
            .await;
        self.check_report(id, &report)?;

        let stage = Instant::now();
        CompletionPoller::new(self.config.poll_interval, self.config.poll_deadline)
            .with_cancel(self.cancel_rx())
            .await_completion(&dirs.staging_out, id, total)
            .await?;
        metrics::record_stage_duration("poll", stage.elapsed().as_secs_f64());
        self.registry
            .update(id, |j| j.advance(JobState::Complete))
            .await;

        let stage = Instant::now();
        let output = Reassembler::new()
            .reassemble(
                id,
                &segmentation.layout,
                total,
                &dirs.staging_out,
                &dirs.output,
            )
            .await?;
        metrics::record_stage_duration("reassemble", stage.elapsed().as_secs_f64());

        Ok(output)
    }

    /// Extract frames, dispatch, poll, re-encode one video stream.
    ///
    /// The result is video-only; for combined jobs the enhanced audio
    /// is muxed back in afterwards.
    async fn video_leg(&self, id: &JobId, source: &Path) -> PipelineResult<PathBuf> {
        if self.is_shutting_down() {
            return Err(PipelineError::Cancelled);
        }
        let dirs = &self.layout.video;
        let fps = self.config.frame_rate;

        self.registry
            .update(id, |j| j.advance(JobState::Segmenting))
            .await;
        let stage = Instant::now();
        let frames = media::extract_frames(source, &dirs.staging_in, id, fps, FRAME_EXT).await?;
        metrics::record_stage_duration("extract_frames", stage.elapsed().as_secs_f64());

        let total = frames.len();
        self.registry.update(id, |j| j.record_segments(total)).await;

        let stage = Instant::now();
        let report = Dispatcher::new(Arc::clone(&self.video_engine))
            .with_cancel(self.cancel_rx())
            .dispatch(&frames, &dirs.staging_out)
            .await?;
        metrics::record_stage_duration("dispatch", stage.elapsed().as_secs_f64());
        metrics::record_dispatch(MediaKind::Video, &report.summary());
        self.registry
            .update(id, |j| {
                j.record_dispatch(report.summary());
                j.advance(JobState::Dispatched);
            })
            .await;
        self.check_report(id, &report)?;

        let stage = Instant::now();
        CompletionPoller::new(self.config.poll_interval, self.config.poll_deadline)
            .with_cancel(self.cancel_rx())
            .await_completion(&dirs.staging_out, id, total)
            .await?;
        metrics::record_stage_duration("poll", stage.elapsed().as_secs_f64());
        self.registry
            .update(id, |j| j.advance(JobState::Complete))
            .await;

        let stage = Instant::now();
        let enhanced = media::list_frames(&dirs.staging_out, id).await?;
        if enhanced.len() < total {
            return Err(PipelineError::Incomplete {
                found: enhanced.len(),
                expected: total,
            });
        }
        let scratch = tempfile::tempdir()?;
        let silent = scratch.path().join(format!("{id}_enhanced.mp4"));
        media::encode_frames(&dirs.staging_out, id, fps, FRAME_EXT, &silent).await?;
        tokio::fs::create_dir_all(&dirs.output).await?;
        let target = dirs.output.join(format!("{id}_enhanced.mp4"));
        media::publish_file(&silent, &target).await?;
        metrics::record_stage_duration("encode_frames", stage.elapsed().as_secs_f64());

        Ok(target)
    }

    /// Demux a container, run both legs, mux the results.
    async fn container_legs(&self, id: &JobId, source: &Path) -> PipelineResult<PathBuf> {
        let audio_src = self.demuxed_audio_path(id);
        let video_src = self.demuxed_video_path(id);

        let stage = Instant::now();
        media::extract_audio(source, &audio_src).await?;
        media::extract_video(source, &video_src).await?;
        metrics::record_stage_duration("demux", stage.elapsed().as_secs_f64());

        let (audio_out, video_out) = tokio::try_join!(
            self.audio_leg(id, &audio_src),
            self.video_leg(id, &video_src)
        )?;

        let stage = Instant::now();
        let scratch = tempfile::tempdir()?;
        let ext = &self.config.container_input_ext;
        let muxed = scratch.path().join(format!("{id}_final.{ext}"));
        media::mux_streams(&video_out, &audio_out, &muxed).await?;

        let target = self.layout.deliverables.join(format!("{id}_final.{ext}"));
        media::publish_file(&muxed, &target).await?;
        metrics::record_stage_duration("mux", stage.elapsed().as_secs_f64());

        Ok(target)
    }

    fn demuxed_audio_path(&self, id: &JobId) -> PathBuf {
        self.layout.audio.input.join(format!("{id}.wav"))
    }

    fn demuxed_video_path(&self, id: &JobId) -> PathBuf {
        let ext = &self.config.container_input_ext;
        self.layout.video.input.join(format!("{id}_plain.{ext}"))
    }

    /// Remove demuxed intermediates so the per-kind inboxes only ever
    /// hold user-supplied sources.
    async fn cleanup_demuxed(&self, id: &JobId) {
        for path in [self.demuxed_audio_path(id), self.demuxed_video_path(id)] {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!(job = %id, "removed demuxed intermediate {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    job = %id,
                    "could not remove demuxed intermediate {}: {e}",
                    path.display()
                ),
            }
        }
    }

    /// Decide what a dispatch report means for the job.
    fn check_report(&self, id: &JobId, report: &DispatchReport) -> PipelineResult<()> {
        for failure in report.failures() {
            if let SegmentDisposition::Failed(cause) = &failure.disposition {
                warn!(job = %id, segment = %failure.file_name, "segment dispatch failed: {cause}");
            }
        }
        if !report.is_clean() {
            return Err(PipelineError::EnhancementFailed {
                failed: report.failed(),
                total: report.total(),
            });
        }
        Ok(())
    }
}
