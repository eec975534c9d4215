use axum::{extract::State, Json};

use framix_core::api_types::{HealthResponse, SettingsUpdate, StatusResponse};
use framix_core::Settings;

use crate::state::AppState;

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.settings.read().await.clone())
}

/// Apply a partial settings update. Jobs snapshot the settings when they
/// start, so changes only affect runs started afterwards.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Json<StatusResponse> {
    let mut settings = state.settings.write().await;
    if let Some(frame_rate) = update.frame_rate {
        settings.frame_rate = frame_rate;
    }
    if let Some(frame_size) = update.frame_size {
        settings.frame_size = frame_size;
    }
    if let Some(upload_batch_size) = update.upload_batch_size {
        settings.upload_batch_size = upload_batch_size;
    }
    if let Some(cloud_base_url) = update.cloud_base_url {
        settings.cloud_base_url = cloud_base_url;
    }
    if let Some(clear) = update.clear_frames_on_reindex {
        settings.clear_frames_on_reindex = clear;
    }
    Json(StatusResponse {
        status: "ok".to_string(),
    })
}
