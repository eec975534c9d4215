use axum::{extract::State, Json};

use framix_model::Job;

use crate::state::AppState;

pub async fn list_jobs(State(state): State<AppState>) -> Json<Vec<Job>> {
    Json(state.registry.jobs().await)
}
