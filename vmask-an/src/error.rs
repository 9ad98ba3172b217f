//! Error types for vmask-an
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Segment-level degradations (missing surrogate, failed clip
//! conversion) are deliberately NOT errors: they resolve to placeholder audio
//! and surface as warnings, so one bad segment never aborts a request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Main error type for vmask-an
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Errors bubbled up from the shared library
    #[error(transparent)]
    Common(#[from] vmask_common::Error),

    /// Source audio cannot be decoded; fatal for the whole request
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Output audio cannot be written
    #[error("Audio encode error: {0}")]
    Encode(String),

    /// Sample rate or channel conversion failure
    #[error("Format conversion error: {0}")]
    FormatConversion(String),

    /// Malformed annotation input
    #[error("Invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Error::InvalidAnnotation(_) => (StatusCode::BAD_REQUEST, "INVALID_ANNOTATION"),
            // Undecodable source audio is a caller problem, not a server one
            Error::Decode(_) => (StatusCode::UNPROCESSABLE_ENTITY, "DECODE_ERROR"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR"),
            Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            Error::Common(_) => (StatusCode::INTERNAL_SERVER_ERROR, "COMMON_ERROR"),
            Error::Encode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ENCODE_ERROR"),
            Error::FormatConversion(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "FORMAT_CONVERSION_ERROR")
            }
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Convenience Result type using vmask-an Error
pub type Result<T> = std::result::Result<T, Error>;
