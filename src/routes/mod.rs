//! Route modules for the PDF-Pile server

pub mod files;
pub mod health;
pub mod pdfs;
pub mod upload;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_upload_bytes = state.config().server.max_upload_bytes;

    Router::new()
        .nest("/health", health::router())
        .nest("/api/pdfs", pdfs::router())
        .nest("/api/upload", upload::router(max_upload_bytes))
        .nest("/uploads", files::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
