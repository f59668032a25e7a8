use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{articles, batches, handlers, middleware, pipeline, uploads};
use crate::state::AppState;

/// Room for the multipart envelope around an upload of the maximum size.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let upload_limit = state.config().uploads.max_bytes + MULTIPART_OVERHEAD_BYTES;

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Articles
        .route("/articles", get(articles::list_articles))
        .route("/articles/generate", post(articles::generate_article))
        .route("/articles/{id}", get(articles::get_article))
        // Topic files
        .route(
            "/topics/upload",
            post(uploads::upload_topics).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Batch runs
        .route("/batches", post(batches::run_batch))
        .route("/pipeline/status", get(pipeline::get_status));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::get_metrics))
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
