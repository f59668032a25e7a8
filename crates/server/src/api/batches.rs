//! Batch run endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use std::io::ErrorKind;
use std::sync::Arc;
use tracing::info;

use contentforge_core::{
    limit_topics, BatchReport, ConcurrencyLimit, InlineTopics, RunOptions, TableFormat, Topic,
    TopicSource, TopicSourceError, TopicTable,
};

use super::handlers::{api_error, pipeline_error, ApiError};
use super::uploads::sanitize_filename;
use crate::state::AppState;

/// Request body for a batch run. Inline `topics` take precedence over `filename`.
#[derive(Debug, Deserialize)]
pub struct RunBatchBody {
    #[serde(default)]
    pub topics: Option<Vec<String>>,
    /// A file previously accepted by `/topics/upload`.
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub column_name: Option<String>,
    #[serde(default)]
    pub publish: bool,
    #[serde(default)]
    pub concurrency: Option<i64>,
}

fn topic_error(e: TopicSourceError) -> ApiError {
    match e {
        TopicSourceError::FileNotFound(_) => api_error(StatusCode::NOT_FOUND, e.to_string()),
        TopicSourceError::Io(_) => api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        _ => api_error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

async fn load_uploaded_topics(
    state: &AppState,
    filename: &str,
    column: &str,
) -> Result<Vec<Topic>, ApiError> {
    let name = sanitize_filename(filename)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Invalid filename"))?;
    let format = TableFormat::from_filename(&name)
        .ok_or_else(|| topic_error(TopicSourceError::UnsupportedFormat(name.clone())))?;
    let path = state.upload_dir().join(&name);

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => topic_error(TopicSourceError::FileNotFound(name.clone())),
        _ => topic_error(TopicSourceError::Io(e.to_string())),
    })?;

    TopicTable::parse(format, &bytes)
        .and_then(|table| table.column_topics(column))
        .map_err(topic_error)
}

/// Run the batch pipeline over inline topics or an uploaded file
pub async fn run_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RunBatchBody>,
) -> Result<Json<BatchReport>, ApiError> {
    let mut options = RunOptions::default().with_publish(body.publish);
    if let Some(n) = body.concurrency {
        let limit = ConcurrencyLimit::new(n)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;
        options = options.with_concurrency(limit);
    }

    let topics = match (body.topics, body.filename) {
        (Some(raw), _) => InlineTopics::new(raw).load().map_err(topic_error)?,
        (None, Some(filename)) => {
            let column = body
                .column_name
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| state.config().uploads.default_column.clone());
            load_uploaded_topics(&state, &filename, &column).await?
        }
        (None, None) => {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Either topics or filename is required",
            ))
        }
    };

    let topics = limit_topics(topics, state.config().pipeline.max_topics);
    info!(topics = topics.len(), publish = options.publish, "Batch requested");

    let report = state
        .pipeline()
        .run(topics, options)
        .await
        .map_err(pipeline_error)?;

    Ok(Json(report))
}
