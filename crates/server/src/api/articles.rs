//! Article API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use contentforge_core::{ArticleQuery, OutcomeStatus, RunOptions, StoredArticle, Topic};

use super::handlers::{api_error, pipeline_error, store_error, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for article queries
const MAX_LIMIT: u32 = 500;

/// Default limit for article queries
const DEFAULT_LIMIT: u32 = 50;

/// Characters of content returned by the single-article endpoint.
const CONTENT_PREVIEW_CHARS: usize = 500;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for generating one article
#[derive(Debug, Deserialize)]
pub struct GenerateArticleBody {
    pub topic: String,
    #[serde(default)]
    pub publish: bool,
}

/// Result of a single-topic run
#[derive(Debug, Serialize)]
pub struct GenerateArticleResponse {
    pub topic: String,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Leading part of the article HTML.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_count: Option<usize>,
    pub stored_in_db: bool,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Query parameters for listing articles
#[derive(Debug, Deserialize)]
pub struct ListArticlesParams {
    /// Case-insensitive topic substring
    pub topic: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Article without its body
#[derive(Debug, Serialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub topic: String,
    pub title: String,
    pub word_count: usize,
    pub created_at: DateTime<Utc>,
}

impl From<StoredArticle> for ArticleSummary {
    fn from(article: StoredArticle) -> Self {
        Self {
            id: article.id,
            topic: article.topic,
            title: article.title,
            word_count: article.word_count,
            created_at: article.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListArticlesResponse {
    pub articles: Vec<ArticleSummary>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
}

fn preview_content(content: &str) -> String {
    if content.chars().count() > CONTENT_PREVIEW_CHARS {
        let head: String = content.chars().take(CONTENT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Generate, store and optionally publish a single article
pub async fn generate_article(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateArticleBody>,
) -> Result<Json<GenerateArticleResponse>, ApiError> {
    let topic =
        Topic::new(&body.topic).ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Topic is required"))?;
    info!(topic = %topic, publish = body.publish, "Generating single article");

    let options = RunOptions::default().with_publish(body.publish);
    let report = state
        .pipeline()
        .run(vec![topic], options)
        .await
        .map_err(pipeline_error)?;

    let outcome = report.outcomes.into_iter().next().ok_or_else(|| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "batch finished without an outcome",
        )
    })?;

    let content = match outcome.article_id {
        Some(id) => Some(preview_content(
            &state.store().get(id).map_err(store_error)?.content,
        )),
        None => None,
    };

    let publish_message = if body.publish && outcome.stored {
        Some(match (&outcome.publish_error, outcome.published) {
            (Some(e), _) => e.clone(),
            (None, true) => "Published successfully".to_string(),
            (None, false) => "Publishing failed".to_string(),
        })
    } else {
        None
    };

    Ok(Json(GenerateArticleResponse {
        topic: outcome.topic,
        status: outcome.status,
        article_id: outcome.article_id,
        title: outcome.title,
        content,
        word_count: outcome.word_count,
        stored_in_db: outcome.stored,
        published: outcome.published,
        publish_message,
        error: outcome.error,
    }))
}

/// List stored articles, newest first
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListArticlesParams>,
) -> Result<Json<ListArticlesResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let query = ArticleQuery {
        topic: params.topic.filter(|t| !t.trim().is_empty()),
        limit,
        offset,
    };

    let articles = state.store().list(&query).map_err(store_error)?;
    let total = state.store().count(&query).map_err(store_error)?;

    Ok(Json(ListArticlesResponse {
        articles: articles.into_iter().map(ArticleSummary::from).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a stored article by id
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<StoredArticle>, ApiError> {
    state.store().get(id).map(Json).map_err(store_error)
}
