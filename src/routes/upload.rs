//! Upload endpoint
//!
//! POST /api/upload with a multipart body: the PDF in a `file` (or `pdf`)
//! field, optional `title`, `author` and `journal` text fields.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};

use crate::annotations::Document;
use crate::error::{AppError, Result};
use crate::library::NewUpload;
use crate::state::AppState;

/// Create the upload router
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload_document))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

/// Store an uploaded PDF and create its record
async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Document>)> {
    let mut upload = NewUpload::default();
    let mut has_file = false;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        tracing::debug!(
            "Received field: name='{}', filename={:?}, content_type={:?}",
            name,
            field.file_name(),
            field.content_type()
        );

        match name.as_str() {
            "file" | "pdf" => {
                upload.filename = field.file_name().unwrap_or("document.pdf").to_string();
                upload.data = field.bytes().await?.to_vec();
                has_file = true;
            }
            "title" => upload.title = Some(field.text().await?),
            "author" => upload.author = Some(field.text().await?),
            "journal" => upload.journal = Some(field.text().await?),
            _ => {}
        }
    }

    if !has_file {
        return Err(AppError::BadRequest("No file uploaded".to_string()));
    }

    let doc = state.library().create(upload).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}
