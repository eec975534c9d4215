use std::path::PathBuf;

/// File extensions recognised as video during folder scans.
///
/// Keeping the list in one place allows the server to expose a user facing
/// configuration later without diverging from the scanner's filtering rules.
pub const DEFAULT_VIDEO_FILE_EXTENSIONS: &[&str] =
    &["mp4", "mov", "mkv", "avi", "m4v", "webm"];

/// Runtime knobs shared by the job pipeline, the scanner, and the HTTP
/// surface. Updated in place through the config endpoint; jobs snapshot the
/// settings when they start.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Settings {
    /// Frames sampled per second of video.
    pub frame_rate: f64,
    /// Width and height each extracted frame is scaled to.
    pub frame_size: (u32, u32),
    pub upload_batch_size: u32,
    /// Root directory extracted frames are written under, one subdirectory
    /// per video.
    pub frames_root: PathBuf,
    /// Base URL of the vector search service.
    pub vector_service_url: String,
    pub video_extensions: Vec<String>,
    /// Wipe a video's frames directory before re-extracting. Off by default
    /// so an interrupted run can be resumed; the extractor overwrites frame
    /// files idempotently either way.
    pub clear_frames_on_reindex: bool,
    pub cloud_base_url: String,
    pub cloud_user_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            frame_rate: 1.0,
            frame_size: (384, 384),
            upload_batch_size: 50,
            frames_root: PathBuf::from("frames"),
            vector_service_url: "http://localhost:8000".to_string(),
            video_extensions: DEFAULT_VIDEO_FILE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            clear_frames_on_reindex: false,
            cloud_base_url: "https://api.example.com".to_string(),
            cloud_user_id: "user_123".to_string(),
        }
    }
}
