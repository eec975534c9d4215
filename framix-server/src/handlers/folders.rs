use axum::{extract::State, Json};

use framix_core::api_types::{RegisterFolderRequest, RegisterFolderResponse};
use framix_model::Folder;

use crate::errors::AppResult;
use crate::state::AppState;

pub async fn list_folders(State(state): State<AppState>) -> Json<Vec<Folder>> {
    Json(state.registry.folders().await)
}

/// Register a folder and start scanning it in the background. The response
/// returns immediately; discovery progress is observed by polling.
pub async fn register_folder(
    State(state): State<AppState>,
    Json(req): Json<RegisterFolderRequest>,
) -> AppResult<Json<RegisterFolderResponse>> {
    let (folder, already_existed) = state
        .scanner
        .register_and_scan(&req.path, req.recursive)
        .await?;
    let status = if already_existed {
        "already_exists".to_string()
    } else {
        "scanning".to_string()
    };
    Ok(Json(RegisterFolderResponse {
        folder_id: folder.id,
        status,
    }))
}
