use axum::{extract::State, Json};

use framix_core::api_types::{CloudAuthRequest, StatusResponse};
use framix_model::CloudStatus;

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn cloud_status(State(state): State<AppState>) -> Json<CloudStatus> {
    Json(state.registry.cloud_status().await)
}

pub async fn cloud_auth(
    State(state): State<AppState>,
    Json(req): Json<CloudAuthRequest>,
) -> AppResult<Json<StatusResponse>> {
    if req.access_token.trim().is_empty() {
        return Err(AppError::bad_request("access_token is required"));
    }
    state.registry.set_cloud_token(req.access_token).await;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}
