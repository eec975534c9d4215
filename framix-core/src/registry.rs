//! Process-lifetime registry of videos, jobs, and folders.
//!
//! The registry is the single owner of every record and of the per-job
//! cancellation tokens. All access goes through one reader-writer lock over
//! the whole table; critical sections are field mutations and map lookups
//! only, never I/O, so holding the lock is always brief. Callers receive
//! snapshot copies and never a live reference into the table.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use framix_model::{
    CloudStatus, Folder, FolderId, FolderStatus, IndexStatus, Job, JobId,
    JobStatus, Video, VideoId,
};

use crate::error::{CoreError, Result};

/// Sentinel recorded as `last_error` when a job is cancelled rather than
/// failing on its own. Callers distinguish cancellation by matching on it.
pub const CANCELLED_ERROR: &str = "cancelled";

#[derive(Debug, Default)]
struct CloudState {
    access_token: Option<String>,
    status: CloudStatus,
}

#[derive(Debug, Default)]
struct Inner {
    videos: HashMap<VideoId, Video>,
    video_by_path: HashMap<String, VideoId>,
    jobs: HashMap<JobId, Job>,
    job_cancel: HashMap<JobId, CancellationToken>,
    folders: HashMap<FolderId, Folder>,
    folder_by_path: HashMap<String, FolderId>,
    cloud: CloudState,
}

/// In-memory table of tracked videos, jobs, and folders.
#[derive(Debug)]
pub struct Registry {
    inner: RwLock<Inner>,
}

impl Registry {
    pub fn new(cloud_user_id: impl Into<String>) -> Self {
        let mut inner = Inner::default();
        inner.cloud.status.user_id = cloud_user_id.into();
        Registry {
            inner: RwLock::new(inner),
        }
    }

    /// Register a video by path. Idempotent: a path that is already tracked
    /// returns the existing identifier and `true` without any mutation.
    pub async fn register_video(
        &self,
        path: &str,
        duration_secs: Option<u32>,
    ) -> Result<(VideoId, bool)> {
        let path = path.trim();
        if path.is_empty() {
            return Err(CoreError::Validation("path is required".to_string()));
        }

        let mut inner = self.inner.write().await;
        if let Some(id) = inner.video_by_path.get(path) {
            return Ok((id.clone(), true));
        }
        let video = Video::new(path, duration_secs);
        let id = video.id.clone();
        inner.video_by_path.insert(path.to_string(), id.clone());
        inner.videos.insert(id.clone(), video);
        Ok((id, false))
    }

    pub async fn video(&self, id: &VideoId) -> Option<Video> {
        self.inner.read().await.videos.get(id).cloned()
    }

    /// Snapshot of every tracked video; safe to read without any lock held.
    pub async fn videos(&self) -> Vec<Video> {
        self.inner.read().await.videos.values().cloned().collect()
    }

    pub async fn job(&self, id: &JobId) -> Option<Job> {
        self.inner.read().await.jobs.get(id).cloned()
    }

    pub async fn jobs(&self) -> Vec<Job> {
        self.inner.read().await.jobs.values().cloned().collect()
    }

    /// The queued or running job for a video, if one exists.
    pub async fn active_job_for(&self, video_id: &VideoId) -> Option<Job> {
        self.inner
            .read()
            .await
            .jobs
            .values()
            .find(|job| job.video_id == *video_id && job.status.is_live())
            .cloned()
    }

    pub async fn register_folder(
        &self,
        path: &str,
        recursive: bool,
    ) -> Result<(Folder, bool)> {
        let path = path.trim();
        if path.is_empty() {
            return Err(CoreError::Validation("path is required".to_string()));
        }

        let mut inner = self.inner.write().await;
        if let Some(id) = inner.folder_by_path.get(path) {
            if let Some(folder) = inner.folders.get(id) {
                return Ok((folder.clone(), true));
            }
        }
        let folder = Folder::new(path, recursive);
        inner
            .folder_by_path
            .insert(path.to_string(), folder.id.clone());
        inner.folders.insert(folder.id.clone(), folder.clone());
        Ok((folder, false))
    }

    pub async fn folder(&self, id: &FolderId) -> Option<Folder> {
        self.inner.read().await.folders.get(id).cloned()
    }

    pub async fn folders(&self) -> Vec<Folder> {
        self.inner.read().await.folders.values().cloned().collect()
    }

    pub async fn set_folder_status(
        &self,
        id: &FolderId,
        status: FolderStatus,
    ) -> Option<Folder> {
        let mut inner = self.inner.write().await;
        let folder = inner.folders.get_mut(id)?;
        folder.status = status;
        Some(folder.clone())
    }

    /// Create a fresh job for a video and reset the video's pipeline state.
    ///
    /// Fails with `NotFound` for an unknown video and with `Conflict` when a
    /// queued or running job already exists; the check and the insertion
    /// happen under one write lock so concurrent callers cannot both win.
    pub async fn create_job(
        &self,
        video_id: &VideoId,
    ) -> Result<(Job, Video, CancellationToken)> {
        let mut inner = self.inner.write().await;

        if let Some(job) = inner
            .jobs
            .values()
            .find(|job| job.video_id == *video_id && job.status.is_live())
        {
            return Err(CoreError::Conflict(format!(
                "video {video_id} already has active job {}",
                job.id
            )));
        }

        let Some(video) = inner.videos.get_mut(video_id) else {
            return Err(CoreError::NotFound(format!("video {video_id}")));
        };

        video.frames_extracted = 0;
        video.frames_uploaded = 0;
        video.total_frames_expected = 0;
        video.index_status = IndexStatus::Extracting;
        video.last_error = None;
        let video = video.clone();

        let job = Job::new(video_id.clone());
        let token = CancellationToken::new();
        inner.job_cancel.insert(job.id.clone(), token.clone());
        inner.jobs.insert(job.id.clone(), job.clone());
        Ok((job, video, token))
    }

    /// Move a queued job to running. No-op once the job has left `Queued`
    /// (a cancel that raced the background task wins).
    pub async fn mark_job_running(&self, job_id: &JobId, expected_total: u64) {
        let mut inner = self.inner.write().await;
        let Inner { jobs, videos, .. } = &mut *inner;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if job.status != JobStatus::Queued {
            return;
        }
        job.status = JobStatus::Running;
        job.progress = 0.0;
        job.updated_at = Utc::now();
        if let Some(video) = videos.get_mut(&job.video_id) {
            video.index_status = IndexStatus::Extracting;
            video.last_error = None;
            if expected_total > video.total_frames_expected {
                video.total_frames_expected = expected_total;
            }
        }
    }

    /// Fold a frames-on-disk observation into the video's counters while
    /// extraction is still writing. Counters only ever move upward.
    pub async fn record_extraction_progress(
        &self,
        job_id: &JobId,
        frames_on_disk: u64,
    ) {
        let mut inner = self.inner.write().await;
        let Inner { jobs, videos, .. } = &mut *inner;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if !job.status.is_live() {
            return;
        }
        let Some(video) = videos.get_mut(&job.video_id) else {
            return;
        };
        if frames_on_disk > video.frames_extracted {
            video.frames_extracted = frames_on_disk;
        }
        if frames_on_disk > video.total_frames_expected {
            video.total_frames_expected = frames_on_disk;
        }
        video.index_status = IndexStatus::Extracting;
        recompute_progress(video, job);
        job.updated_at = Utc::now();
    }

    /// Rebase counters on the definitive frame count once extraction has
    /// finished, and move the video into the indexing phase.
    pub async fn begin_indexing(&self, job_id: &JobId, frame_count: u64) {
        let mut inner = self.inner.write().await;
        let Inner { jobs, videos, .. } = &mut *inner;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if !job.status.is_live() {
            return;
        }
        let Some(video) = videos.get_mut(&job.video_id) else {
            return;
        };
        video.index_status = IndexStatus::Indexing;
        video.frames_uploaded = 0;
        video.frames_extracted = frame_count;
        video.total_frames_expected = frame_count;
        recompute_progress(video, job);
        job.updated_at = Utc::now();
    }

    pub async fn record_frame_uploaded(
        &self,
        job_id: &JobId,
        uploaded: u64,
        total: u64,
    ) {
        let mut inner = self.inner.write().await;
        let Inner { jobs, videos, .. } = &mut *inner;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if !job.status.is_live() {
            return;
        }
        let Some(video) = videos.get_mut(&job.video_id) else {
            return;
        };
        if uploaded > video.frames_uploaded {
            video.frames_uploaded = uploaded;
        }
        if total > video.total_frames_expected {
            video.total_frames_expected = total;
        }
        if video.frames_extracted < total {
            video.frames_extracted = total;
        }
        video.index_status = IndexStatus::Indexing;
        recompute_progress(video, job);
        job.updated_at = Utc::now();
    }

    /// Terminal success: progress is forced to exactly `1.0` and the cloud
    /// bookkeeping records the upload. No-op if the job already terminated.
    pub async fn complete_job(&self, job_id: &JobId) {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let Inner {
            jobs,
            videos,
            cloud,
            ..
        } = &mut *inner;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if !job.status.is_live() {
            return;
        }
        job.status = JobStatus::Done;
        job.progress = 1.0;
        job.updated_at = now;
        if let Some(video) = videos.get_mut(&job.video_id) {
            if video.frames_extracted < video.frames_uploaded {
                video.frames_extracted = video.frames_uploaded;
            }
            if video.total_frames_expected < video.frames_uploaded {
                video.total_frames_expected = video.frames_uploaded;
            }
            video.index_status = IndexStatus::Indexed;
            video.last_error = None;
            video.last_indexed_at = Some(now);
        }
        cloud.status.connected = cloud.access_token.is_some();
        cloud.status.pending_batches = 0;
        cloud.status.last_successful_upload = Some(now);
        info!(job = %job_id, "job completed");
    }

    /// Terminal failure. Progress is left where it was so readers never see
    /// it move backwards. No-op if the job already terminated.
    pub async fn fail_job(&self, job_id: &JobId, message: &str) {
        let mut inner = self.inner.write().await;
        let Inner { jobs, videos, .. } = &mut *inner;
        let Some(job) = jobs.get_mut(job_id) else {
            return;
        };
        if !job.status.is_live() {
            return;
        }
        job.status = JobStatus::Failed;
        job.updated_at = Utc::now();
        if let Some(video) = videos.get_mut(&job.video_id) {
            video.index_status = IndexStatus::Failed;
            video.last_error = Some(message.to_string());
        }
        info!(job = %job_id, error = message, "job failed");
    }

    /// Cancel the live job for a video, if any. The cancellation token is
    /// removed from the index in the same critical section that signals it,
    /// so a token can never be signalled twice. The job and video are marked
    /// failed synchronously; the background task observes the token and
    /// unwinds on its own time.
    pub async fn cancel_job(&self, video_id: &VideoId) -> Result<JobId> {
        let mut inner = self.inner.write().await;
        let Inner {
            jobs,
            videos,
            job_cancel,
            ..
        } = &mut *inner;

        let Some(job) = jobs
            .values_mut()
            .find(|job| job.video_id == *video_id && job.status.is_live())
        else {
            return Err(CoreError::NotFound(format!(
                "no active job for video {video_id}"
            )));
        };

        if let Some(token) = job_cancel.remove(&job.id) {
            token.cancel();
        }
        job.status = JobStatus::Failed;
        job.updated_at = Utc::now();
        if let Some(video) = videos.get_mut(video_id) {
            video.index_status = IndexStatus::Failed;
            video.last_error = Some(CANCELLED_ERROR.to_string());
        }
        info!(job = %job.id, video = %video_id, "job cancelled");
        Ok(job.id.clone())
    }

    /// Drop a job's cancellation token, if still present. Called when the
    /// background task exits on any path.
    pub async fn remove_cancel(&self, job_id: &JobId) {
        self.inner.write().await.job_cancel.remove(job_id);
    }

    pub async fn cloud_status(&self) -> CloudStatus {
        self.inner.read().await.cloud.status.clone()
    }

    pub async fn set_cloud_token(&self, access_token: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.cloud.access_token = Some(access_token.into());
        inner.cloud.status.connected = true;
    }
}

/// Single source of truth for job progress: uploaded frames over the
/// expected total, clamped strictly below `1.0` for every non-terminal job.
/// Progress never decreases over a job's lifetime.
fn recompute_progress(video: &Video, job: &mut Job) {
    let expected = video.total_frames_expected.max(1);
    let mut progress = video.frames_uploaded as f64 / expected as f64;
    if job.status != JobStatus::Done && progress >= 1.0 {
        progress = 1.0_f64.next_down();
    }
    if progress > job.progress {
        job.progress = progress;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn concurrent_job_creation_admits_exactly_one() {
        let registry = Arc::new(Registry::new("user_123"));
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                registry.create_job(&id).await.is_ok()
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);

        let live: Vec<_> = registry
            .jobs()
            .await
            .into_iter()
            .filter(|job| job.status.is_live())
            .collect();
        assert_eq!(live.len(), 1);
    }

    #[tokio::test]
    async fn register_video_is_idempotent_by_path() {
        let registry = Registry::new("user_123");
        let (first, existed) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        assert!(!existed);
        let (second, existed) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        assert!(existed);
        assert_eq!(first, second);
        assert_eq!(registry.videos().await.len(), 1);
    }

    #[tokio::test]
    async fn register_video_rejects_empty_path() {
        let registry = Registry::new("user_123");
        let err = registry.register_video("   ", None).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn create_job_rejects_second_live_job() {
        let registry = Registry::new("user_123");
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        registry.create_job(&id).await.unwrap();
        let err = registry.create_job(&id).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_job_resets_video_counters() {
        let registry = Registry::new("user_123");
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        let (job, _, _) = registry.create_job(&id).await.unwrap();
        registry.record_extraction_progress(&job.id, 7).await;
        registry.fail_job(&job.id, "boom").await;

        let (_, video, _) = registry.create_job(&id).await.unwrap();
        assert_eq!(video.frames_extracted, 0);
        assert_eq!(video.total_frames_expected, 0);
        assert_eq!(video.index_status, IndexStatus::Extracting);
        assert_eq!(video.last_error, None);
    }

    #[tokio::test]
    async fn cancel_without_active_job_is_not_found() {
        let registry = Registry::new("user_123");
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        let err = registry.cancel_job(&id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
        assert_eq!(
            registry.video(&id).await.unwrap().index_status,
            IndexStatus::Pending
        );
    }

    #[tokio::test]
    async fn cancel_marks_job_and_video_failed_synchronously() {
        let registry = Registry::new("user_123");
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        let (job, _, token) = registry.create_job(&id).await.unwrap();

        registry.cancel_job(&id).await.unwrap();
        assert!(token.is_cancelled());

        let job = registry.job(&job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        let video = registry.video(&id).await.unwrap();
        assert_eq!(video.index_status, IndexStatus::Failed);
        assert_eq!(video.last_error.as_deref(), Some(CANCELLED_ERROR));
    }

    #[tokio::test]
    async fn terminal_jobs_do_not_resurrect() {
        let registry = Registry::new("user_123");
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        let (job, _, _) = registry.create_job(&id).await.unwrap();
        registry.cancel_job(&id).await.unwrap();

        // Late transitions from an unwinding background task must not win.
        registry.mark_job_running(&job.id, 10).await;
        registry.begin_indexing(&job.id, 10).await;
        registry.complete_job(&job.id).await;

        let job = registry.job(&job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        let video = registry.video(&id).await.unwrap();
        assert_eq!(video.index_status, IndexStatus::Failed);
    }

    #[tokio::test]
    async fn progress_is_clamped_below_one_until_done() {
        let registry = Registry::new("user_123");
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        let (job, _, _) = registry.create_job(&id).await.unwrap();
        registry.mark_job_running(&job.id, 4).await;
        registry.begin_indexing(&job.id, 4).await;
        registry.record_frame_uploaded(&job.id, 4, 4).await;

        let live = registry.job(&job.id).await.unwrap();
        assert!(live.progress < 1.0);

        registry.complete_job(&job.id).await;
        let done = registry.job(&job.id).await.unwrap();
        assert_eq!(done.progress, 1.0);
        assert_eq!(done.status, JobStatus::Done);
    }

    #[tokio::test]
    async fn failed_job_keeps_its_progress() {
        let registry = Registry::new("user_123");
        let (id, _) =
            registry.register_video("/videos/a.mp4", None).await.unwrap();
        let (job, _, _) = registry.create_job(&id).await.unwrap();
        registry.mark_job_running(&job.id, 10).await;
        registry.begin_indexing(&job.id, 10).await;
        registry.record_frame_uploaded(&job.id, 5, 10).await;

        let before = registry.job(&job.id).await.unwrap().progress;
        registry.fail_job(&job.id, "upload exploded").await;
        let after = registry.job(&job.id).await.unwrap();
        assert_eq!(after.progress, before);
        assert_eq!(after.status, JobStatus::Failed);
    }
}
