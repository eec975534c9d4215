use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::header,
    response::Response,
    Json,
};
use tokio_util::io::ReaderStream;

use framix_core::api_types::{
    CancelJobResponse, RegisterVideoRequest, RegisterVideoResponse,
    StartJobRequest, StartJobResponse,
};
use framix_model::{Video, VideoId};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

pub async fn list_videos(State(state): State<AppState>) -> Json<Vec<Video>> {
    Json(state.registry.videos().await)
}

pub async fn register_video(
    State(state): State<AppState>,
    Json(req): Json<RegisterVideoRequest>,
) -> AppResult<Json<RegisterVideoResponse>> {
    let (video_id, already_existed) = state
        .registry
        .register_video(&req.path, req.duration_secs)
        .await?;
    let status = if already_existed {
        "already_exists"
    } else {
        "scheduled"
    };
    Ok(Json(RegisterVideoResponse {
        video_id,
        status: status.to_string(),
    }))
}

pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Video>> {
    let video = state
        .registry
        .video(&VideoId::from_string(id))
        .await
        .ok_or_else(|| AppError::not_found("video not found"))?;
    Ok(Json(video))
}

pub async fn start_extraction(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<StartJobResponse>> {
    // An absent body means "no reindex"; anything present must parse.
    let StartJobRequest { reindex } = if body.is_empty() {
        StartJobRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| AppError::bad_request("invalid json payload"))?
    };
    let job = state
        .jobs
        .start_job(&VideoId::from_string(id), reindex)
        .await?;
    Ok(Json(StartJobResponse {
        status: "started".to_string(),
        job_id: job.id,
    }))
}

pub async fn cancel_extraction(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CancelJobResponse>> {
    state.jobs.cancel_job(&VideoId::from_string(id)).await?;
    Ok(Json(CancelJobResponse {
        status: "cancelling".to_string(),
    }))
}

/// Stream a registered video's file contents back to the caller.
pub async fn video_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let video = state
        .registry
        .video(&VideoId::from_string(id))
        .await
        .ok_or_else(|| AppError::not_found("video not found"))?;

    let file = tokio::fs::File::open(&video.path).await.map_err(|err| {
        AppError::not_found(format!("video file unavailable: {err}"))
    })?;
    let stream = ReaderStream::new(file);

    Response::builder()
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .body(Body::from_stream(stream))
        .map_err(|err| AppError::internal(err.to_string()))
}
