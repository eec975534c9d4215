use axum::{extract::State, Json};

use framix_core::api_types::{SearchRequest, SearchResponse};

use crate::errors::{AppError, AppResult};
use crate::state::AppState;

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_CLUSTER_THRESHOLD: f64 = 5.0;

/// Thin proxy over the vector search collaborator.
pub async fn search_videos(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> AppResult<Json<SearchResponse>> {
    if req.query.trim().is_empty() {
        return Err(AppError::bad_request("query is required"));
    }
    let top_k = match req.top_k {
        Some(top_k) if top_k > 0 => top_k,
        _ => DEFAULT_TOP_K,
    };
    let cluster_threshold = match req.cluster_threshold {
        Some(threshold) if threshold > 0.0 => threshold,
        _ => DEFAULT_CLUSTER_THRESHOLD,
    };

    let results = state
        .indexer
        .search(&req.query, top_k, cluster_threshold)
        .await?;
    Ok(Json(SearchResponse { results }))
}
