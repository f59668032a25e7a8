//! Pipeline status endpoint.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use contentforge_core::PoolStatus;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PipelineStatusResponse {
    /// Whether runs may request publishing.
    pub publisher_configured: bool,
    #[serde(flatten)]
    pub pool: PoolStatus,
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<PipelineStatusResponse> {
    let pipeline = state.pipeline();
    Json(PipelineStatusResponse {
        publisher_configured: pipeline.has_publisher(),
        pool: pipeline.status(),
    })
}
