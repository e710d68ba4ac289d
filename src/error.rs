use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaServerError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Path is outside the media directory")]
    PathTraversal,

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("QR encoding failed: {0}")]
    Encoding(String),

    #[error("Cannot read media directory: {0}")]
    DirectoryUnreadable(String),

    #[error("Failed to create QR output directory: {0}")]
    CreateDirFailed(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    code: &'static str,
}

impl IntoResponse for MediaServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            MediaServerError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            MediaServerError::PathTraversal => (StatusCode::FORBIDDEN, "PATH_TRAVERSAL"),
            MediaServerError::InvalidFilename(_) => (StatusCode::BAD_REQUEST, "INVALID_FILENAME"),
            MediaServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            MediaServerError::Encoding(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "ENCODING_FAILED")
            }
            MediaServerError::DirectoryUnreadable(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "DIRECTORY_UNREADABLE")
            }
            MediaServerError::CreateDirFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "CREATE_DIR_FAILED")
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code,
        };

        (status, Json(body)).into_response()
    }
}
