use chrono::{DateTime, Utc};

use crate::ids::{JobId, VideoId};

/// Job lifecycle state. `Done` and `Failed` are terminal; a job is never
/// reused or restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Done,
    Failed,
}

impl JobStatus {
    /// A live job is one that may still mutate its video's counters.
    pub fn is_live(self) -> bool {
        matches!(self, JobStatus::Queued | JobStatus::Running)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_live()
    }
}

/// What a job does. There is a single pipeline today; the enum keeps the
/// wire shape stable if more pipelines show up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    ExtractAndUpload,
}

/// One execution attempt of the extract-then-index pipeline for a video.
///
/// `progress` stays strictly below `1.0` until the job reaches `Done`, at
/// which point it is exactly `1.0`.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Job {
    #[serde(rename = "job_id")]
    pub id: JobId,
    pub video_id: VideoId,
    #[serde(rename = "type")]
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(video_id: VideoId) -> Self {
        let now = Utc::now();
        Job {
            id: JobId::new(),
            video_id,
            kind: JobKind::ExtractAndUpload,
            status: JobStatus::Queued,
            progress: 0.0,
            created_at: now,
            updated_at: now,
        }
    }
}
