//! Vector search collaborator boundary.
//!
//! The indexing half of the pipeline hands each extracted frame, plus enough
//! metadata to map it back onto the video's timeline, to an external search
//! service. Delivery is at-least-once with no dedup; a failed upload aborts
//! the whole job rather than leaving a partially indexed video behind.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;

use framix_model::VideoId;

use crate::error::{CoreError, Result};

/// One frame handed to the search backend.
#[derive(Debug, Clone)]
pub struct UploadFrame {
    pub file_path: PathBuf,
    pub video_id: VideoId,
    pub video_path: String,
    /// 1-based position within the extracted sequence.
    pub frame_number: u64,
    /// Seconds from the start of the video.
    pub timestamp: f64,
    pub frame_rate: f64,
}

/// A scored time range within one video.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct SearchHit {
    pub start: f64,
    pub end: f64,
    pub relevance_score: f64,
}

/// Per-video result of a text query against the search backend.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct VideoSearchResult {
    pub video_id: String,
    pub video_path: String,
    pub timestamps: Vec<SearchHit>,
    pub max_relevance_score: f64,
}

/// Seam between the core and the vector search service.
#[async_trait]
pub trait FrameIndexer: Send + Sync {
    /// Submit one frame; returns the backend's opaque identifier for it.
    async fn upload_frame(&self, frame: &UploadFrame) -> Result<String>;

    /// Text query returning scored time ranges per video.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        cluster_threshold: f64,
    ) -> Result<Vec<VideoSearchResult>>;
}

/// HTTP client for the vector search service.
#[derive(Debug, Clone)]
pub struct VectorServiceClient {
    base_url: String,
    http: reqwest::Client,
}

impl VectorServiceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| {
                CoreError::Internal(format!("build http client: {err}"))
            })?;
        Ok(VectorServiceClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }
}

#[async_trait]
impl FrameIndexer for VectorServiceClient {
    async fn upload_frame(&self, frame: &UploadFrame) -> Result<String> {
        let bytes = tokio::fs::read(&frame.file_path).await.map_err(|err| {
            CoreError::Indexing(format!(
                "read frame {}: {err}",
                frame.file_path.display()
            ))
        })?;
        let file_name = frame
            .file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "frame.jpg".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("image/jpeg")
            .map_err(|err| {
                CoreError::Indexing(format!("build frame part: {err}"))
            })?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("video_id", frame.video_id.to_string())
            .text("video_path", frame.video_path.clone())
            .text("frame_number", frame.frame_number.to_string())
            .text("frame_rate", frame.frame_rate.to_string())
            .text("timestamp", frame.timestamp.to_string());

        let response = self
            .http
            .post(format!("{}/upload_image", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                CoreError::Indexing(format!("vector service request: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Indexing(format!(
                "vector service upload failed ({status}): {}",
                body.trim()
            )));
        }

        #[derive(serde::Deserialize)]
        struct UploadResponse {
            id: String,
        }
        let payload: UploadResponse = response.json().await.map_err(|err| {
            CoreError::Indexing(format!("decode vector service response: {err}"))
        })?;
        if payload.id.is_empty() {
            return Err(CoreError::Indexing(
                "vector service returned an empty id".to_string(),
            ));
        }
        Ok(payload.id)
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        cluster_threshold: f64,
    ) -> Result<Vec<VideoSearchResult>> {
        if query.trim().is_empty() {
            return Err(CoreError::Validation(
                "query cannot be empty".to_string(),
            ));
        }

        let response = self
            .http
            .post(format!("{}/search_video", self.base_url))
            .json(&serde_json::json!({
                "query": query,
                "top_k": top_k,
                "cluster_threshold": cluster_threshold,
            }))
            .send()
            .await
            .map_err(|err| {
                CoreError::Indexing(format!("vector service request: {err}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CoreError::Indexing(format!(
                "vector service search failed ({status}): {}",
                body.trim()
            )));
        }

        #[derive(serde::Deserialize)]
        struct SearchResponse {
            results: Vec<VideoSearchResult>,
        }
        let payload: SearchResponse = response.json().await.map_err(|err| {
            CoreError::Indexing(format!("decode vector service response: {err}"))
        })?;
        Ok(payload.results)
    }
}
