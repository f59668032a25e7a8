//! Topic file upload.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use contentforge_core::{TableFormat, TablePreview, TopicTable};

use super::handlers::{api_error, ApiError};
use crate::state::AppState;

/// Data rows included in an upload preview.
const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Name the file was saved under; pass it to `/batches`.
    pub filename: String,
    #[serde(flatten)]
    pub preview: TablePreview,
}

/// Strips any client-side directory part. Hidden and empty names are rejected.
pub(crate) fn sanitize_filename(raw: &str) -> Option<String> {
    let name = raw.rsplit(|c| c == '/' || c == '\\').next()?.trim();
    if name.is_empty() || name.starts_with('.') {
        return None;
    }
    Some(name.to_string())
}

/// Accept a CSV or Excel topic file, keep it in the upload directory and
/// return a preview
pub async fn upload_topics(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let max_bytes = state.config().uploads.max_bytes;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(e.status(), e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| api_error(e.status(), e.body_text()))?;
        upload = Some((filename, bytes.to_vec()));
    }

    let (raw_name, bytes) =
        upload.ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No file uploaded"))?;
    let filename = sanitize_filename(&raw_name)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "No file selected"))?;

    let format = TableFormat::from_filename(&filename).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            "Please upload a CSV or Excel file (.csv, .xlsx, .xls)",
        )
    })?;

    if bytes.len() > max_bytes {
        return Err(api_error(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("File exceeds the {} byte upload limit", max_bytes),
        ));
    }

    let preview = TopicTable::parse(format, &bytes)
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?
        .preview(PREVIEW_ROWS);

    let dir = state.upload_dir();
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to create upload directory: {}", e),
        )
    })?;
    tokio::fs::write(dir.join(&filename), &bytes)
        .await
        .map_err(|e| {
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save upload: {}", e),
            )
        })?;

    info!(
        filename = %filename,
        format = format.as_str(),
        rows = preview.total_rows,
        columns = preview.columns.len(),
        "Topic file uploaded"
    );

    Ok(Json(UploadResponse { filename, preview }))
}
