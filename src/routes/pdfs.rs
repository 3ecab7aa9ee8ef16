//! Document API endpoints
//!
//! - GET /api/pdfs - list documents
//! - GET /api/pdfs/:id - document with annotations
//! - PUT /api/pdfs/:id - merge metadata and/or annotations
//! - DELETE /api/pdfs/:id - remove document and file

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};

use crate::annotations::{Document, DocumentPatch, DocumentSummary};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Create the documents router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_documents))
        .route(
            "/:id",
            get(get_document).put(update_document).delete(delete_document),
        )
}

/// List all documents
async fn list_documents(State(state): State<AppState>) -> Json<Vec<DocumentSummary>> {
    Json(state.library().list().await)
}

/// Get a document with its annotations
async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    let doc = state
        .library()
        .get(&id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Document '{}' not found", id)))?;
    Ok(Json(doc))
}

/// Merge the provided fields over the stored document
async fn update_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<DocumentPatch>,
) -> Result<Json<Document>> {
    let doc = state
        .library()
        .update(&id, patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Document '{}' not found", id)))?;
    Ok(Json(doc))
}

/// Delete a document and its file
async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.library().delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Document '{}' not found", id)))
    }
}
