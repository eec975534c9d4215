use chrono::{DateTime, Utc};

use crate::ids::VideoId;

/// Where a video sits in the extract-then-index pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    Pending,
    Extracting,
    Indexing,
    Indexed,
    Failed,
}

/// A tracked media file and its extraction/indexing bookkeeping.
///
/// Counters only ever move upward while a job is live; `total_frames_expected`
/// is an estimate that gets revised upward as better information arrives.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Video {
    #[serde(rename = "video_id")]
    pub id: VideoId,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    pub index_status: IndexStatus,
    pub frames_extracted: u64,
    pub frames_uploaded: u64,
    pub total_frames_expected: u64,
    pub last_indexed_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Video {
    pub fn new(path: impl Into<String>, duration_secs: Option<u32>) -> Self {
        Video {
            id: VideoId::new(),
            path: path.into(),
            duration_secs,
            index_status: IndexStatus::Pending,
            frames_extracted: 0,
            frames_uploaded: 0,
            total_frames_expected: 0,
            last_indexed_at: None,
            last_error: None,
        }
    }
}
