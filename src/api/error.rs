use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::MessageResponse;
use crate::services::ImageError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    ValidationError(String),

    Unauthorized(String),

    /// Image decode/encode failure. The message is shown to the client, so
    /// callers log the underlying detail themselves.
    ProcessingError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::ProcessingError(msg) => write!(f, "Processing error: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::ProcessingError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Json(MessageResponse::failure(message))).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidFilename => Self::validation("Invalid filename"),
            ImageError::InvalidFileType(_) => Self::validation(err.to_string()),
            ImageError::NotFound(_) => Self::NotFound("File not found".to_string()),
            ImageError::Processing { .. } => {
                tracing::error!(error = %err, "Image processing failed");
                Self::ProcessingError("Failed to process image".to_string())
            }
            ImageError::Io(e) => Self::internal(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_error_mapping() {
        let status = |err: ImageError| ApiError::from(err).into_response().status();

        assert_eq!(status(ImageError::InvalidFilename), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(ImageError::InvalidFileType("a.txt".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ImageError::NotFound("a.jpg".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(ImageError::Processing {
                filename: "a.jpg".into(),
                message: "corrupt".into(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
