//! Request/response payloads shared between the core and the HTTP surface.

use framix_model::{FolderId, JobId, VideoId};

use crate::search::VideoSearchResult;

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RegisterVideoRequest {
    pub path: String,
    #[serde(default)]
    pub duration_secs: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RegisterVideoResponse {
    pub video_id: VideoId,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RegisterFolderRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct RegisterFolderResponse {
    pub folder_id: FolderId,
    pub status: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct StartJobRequest {
    #[serde(default)]
    pub reindex: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct StartJobResponse {
    pub status: String,
    pub job_id: JobId,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct CancelJobResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
    pub query: String,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub cluster_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
    pub results: Vec<VideoSearchResult>,
}

/// Partial update for the runtime settings; absent fields are left alone.
#[derive(Debug, Clone, PartialEq, Default)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub frame_size: Option<(u32, u32)>,
    #[serde(default)]
    pub upload_batch_size: Option<u32>,
    #[serde(default)]
    pub cloud_base_url: Option<String>,
    #[serde(default)]
    pub clear_frames_on_reindex: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct CloudAuthRequest {
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct StatusResponse {
    pub status: String,
}
