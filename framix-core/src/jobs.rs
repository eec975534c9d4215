//! The extract-then-index job pipeline.
//!
//! One background task per live job. The task launches extraction in its own
//! task so a fixed-interval poll can watch the frames directory while ffmpeg
//! is still writing, then uploads every frame in order. Cancellation is
//! cooperative: the token is checked at every poll tick and before each
//! upload, and `tokio::select!` races it against the other two wakeups so it
//! always preempts them.
//!
//! All record transitions go through the [`Registry`], whose terminal-state
//! guards make the late writes of an unwinding task harmless.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use framix_model::{Job, JobId, Video, VideoId};

use crate::error::{CoreError, Result};
use crate::extract::{
    frames_dir_for, list_frame_files, ExtractionSpec, FrameExtractor,
};
use crate::registry::Registry;
use crate::search::{FrameIndexer, UploadFrame};
use crate::settings::Settings;

/// How often the frames directory is re-counted while extraction runs.
const EXTRACTION_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Schedules and drives extract-and-upload jobs.
#[derive(Clone)]
pub struct JobManager {
    registry: Arc<Registry>,
    extractor: Arc<dyn FrameExtractor>,
    indexer: Arc<dyn FrameIndexer>,
    settings: Arc<RwLock<Settings>>,
}

impl fmt::Debug for JobManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobManager")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl JobManager {
    pub fn new(
        registry: Arc<Registry>,
        extractor: Arc<dyn FrameExtractor>,
        indexer: Arc<dyn FrameIndexer>,
        settings: Arc<RwLock<Settings>>,
    ) -> Self {
        JobManager {
            registry,
            extractor,
            indexer,
            settings,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Start a job for a video and return it immediately; all further state
    /// changes are observed by polling the registry. At most one live job
    /// may exist per video; a second start reports `Conflict`.
    pub async fn start_job(
        &self,
        video_id: &VideoId,
        reindex: bool,
    ) -> Result<Job> {
        let (job, video, token) = self.registry.create_job(video_id).await?;
        let settings = self.settings.read().await.clone();
        info!(video = %video_id, job = %job.id, reindex, "starting extract-and-upload job");

        let manager = self.clone();
        let job_id = job.id.clone();
        tokio::spawn(async move {
            manager
                .run_job(job_id, video, settings, token, reindex)
                .await;
        });
        Ok(job)
    }

    /// Cancel the live job for a video. The terminal state is visible to
    /// readers as soon as this returns, even while the background task is
    /// still unwinding.
    pub async fn cancel_job(&self, video_id: &VideoId) -> Result<JobId> {
        self.registry.cancel_job(video_id).await
    }

    async fn run_job(
        &self,
        job_id: JobId,
        video: Video,
        settings: Settings,
        token: CancellationToken,
        reindex: bool,
    ) {
        let frames_dir = frames_dir_for(&settings.frames_root, &video.path);

        let mut expected = video.total_frames_expected;
        if expected == 0 {
            expected = estimate_frames(video.duration_secs, settings.frame_rate);
        }
        self.registry
            .mark_job_running(&job_id, expected.max(1))
            .await;

        let outcome = self
            .drive(&job_id, &video, &frames_dir, &settings, &token, reindex)
            .await;
        match outcome {
            Ok(()) => self.registry.complete_job(&job_id).await,
            Err(CoreError::Cancelled) => {
                // cancel_job already recorded the terminal state; this only
                // covers a task that observed its token before anyone else.
                self.registry
                    .fail_job(&job_id, crate::registry::CANCELLED_ERROR)
                    .await;
            }
            Err(err) => {
                self.registry.fail_job(&job_id, &err.to_string()).await;
            }
        }
        self.registry.remove_cancel(&job_id).await;
    }

    async fn drive(
        &self,
        job_id: &JobId,
        video: &Video,
        frames_dir: &Path,
        settings: &Settings,
        token: &CancellationToken,
        reindex: bool,
    ) -> Result<()> {
        if token.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        tokio::fs::create_dir_all(&settings.frames_root)
            .await
            .map_err(|err| {
                CoreError::Extraction(format!("prepare frames root: {err}"))
            })?;
        if reindex && settings.clear_frames_on_reindex {
            match tokio::fs::remove_dir_all(frames_dir).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(CoreError::Extraction(format!(
                        "clear frames dir: {err}"
                    )));
                }
            }
        }

        let extractor = Arc::clone(&self.extractor);
        let input = PathBuf::from(&video.path);
        let dir = frames_dir.to_path_buf();
        let spec = ExtractionSpec {
            frame_rate: settings.frame_rate,
            frame_size: settings.frame_size,
        };
        let mut extraction = tokio::spawn(async move {
            extractor.extract(&input, &dir, &spec).await
        });

        let mut poll = tokio::time::interval(EXTRACTION_POLL_INTERVAL);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    return Err(CoreError::Cancelled);
                }
                joined = &mut extraction => {
                    let result = joined.map_err(|err| {
                        CoreError::Extraction(format!("extraction task aborted: {err}"))
                    })?;
                    result.map_err(|err| match err {
                        err @ CoreError::Extraction(_) => err,
                        other => CoreError::Extraction(other.to_string()),
                    })?;
                    return self
                        .index_frames(job_id, video, frames_dir, settings, token)
                        .await;
                }
                _ = poll.tick() => {
                    let frames = list_frame_files(frames_dir).await.map_err(|err| {
                        CoreError::Extraction(format!("monitor frames dir: {err}"))
                    })?;
                    self.registry
                        .record_extraction_progress(job_id, frames.len() as u64)
                        .await;
                }
            }
        }
    }

    /// Upload every extracted frame in temporal order. Any single failure
    /// aborts the job; there is no partial-success state and no retry.
    async fn index_frames(
        &self,
        job_id: &JobId,
        video: &Video,
        frames_dir: &Path,
        settings: &Settings,
        token: &CancellationToken,
    ) -> Result<()> {
        let frames = list_frame_files(frames_dir).await.map_err(|err| {
            CoreError::Extraction(format!("list frames dir: {err}"))
        })?;
        if frames.is_empty() {
            return Err(CoreError::Extraction(
                "no frames extracted".to_string(),
            ));
        }

        let total = frames.len() as u64;
        self.registry.begin_indexing(job_id, total).await;

        for (index, frame) in frames.iter().enumerate() {
            if token.is_cancelled() {
                return Err(CoreError::Cancelled);
            }

            let frame_number = index as u64 + 1;
            let upload = UploadFrame {
                file_path: frame.clone(),
                video_id: video.id.clone(),
                video_path: video.path.clone(),
                frame_number,
                timestamp: index as f64 / settings.frame_rate,
                frame_rate: settings.frame_rate,
            };
            self.indexer.upload_frame(&upload).await.map_err(|err| {
                warn!(job = %job_id, frame = frame_number, error = %err, "frame upload failed");
                match err {
                    err @ CoreError::Indexing(_) => err,
                    other => CoreError::Indexing(other.to_string()),
                }
            })?;
            self.registry
                .record_frame_uploaded(job_id, frame_number, total)
                .await;
        }
        Ok(())
    }
}

/// Rough frame count from duration and sampling rate; zero when the
/// duration is unknown so the estimate defers to directory observations.
fn estimate_frames(duration_secs: Option<u32>, frame_rate: f64) -> u64 {
    match duration_secs {
        Some(secs) => (f64::from(secs) * frame_rate).ceil() as u64,
        None => 0,
    }
}
