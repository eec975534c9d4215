use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{cloud, folders, jobs, search, system, videos};
use crate::AppState;

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        // System
        .route("/health", get(system::health))
        .route(
            "/config",
            get(system::get_settings).put(system::update_settings),
        )
        // Videos and their jobs
        .route(
            "/videos",
            get(videos::list_videos).post(videos::register_video),
        )
        .route("/videos/{id}", get(videos::get_video))
        .route("/videos/{id}/extract", post(videos::start_extraction))
        .route("/videos/{id}/cancel", post(videos::cancel_extraction))
        .route("/videos/{id}/file", get(videos::video_file))
        // Folders
        .route(
            "/folders",
            get(folders::list_folders).post(folders::register_folder),
        )
        // Jobs
        .route("/jobs", get(jobs::list_jobs))
        // Search proxy
        .route("/search", post(search::search_videos))
        // Cloud
        .route("/cloud/status", get(cloud::cloud_status))
        .route("/cloud/auth", post(cloud::cloud_auth))
}
