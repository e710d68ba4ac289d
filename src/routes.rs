use axum::{routing::get, Router};

use crate::handlers;
use crate::AppState;

/// Create media server routes
pub fn media_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Listing and media pages
        .route("/", get(handlers::index))
        .route("/media/:filename", get(handlers::media_page))
        // Static assets
        .route("/files/:filename", get(handlers::serve_file))
        .route("/qrcodes/:filename", get(handlers::serve_qr))
        // QR generation
        .route("/generate-qr/:filename", get(handlers::generate_qr))
        .route("/generate-all-qr", get(handlers::generate_all_qr))
}
