use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
        rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use super::validation::{validate_filename, validate_rotation};
use super::{
    ApiError, AppState, DeleteImageRequest, ErrorBody, ImageListError, ImageListResponse,
    MessageResponse, RotateImageRequest, UploadFailure, UploadResponse,
};
use crate::services::{ImageError, UploadedFile};

const UPLOAD_FIELD: &str = "images";

/// GET /gallery
///
/// Public JSON listing in directory order.
pub async fn gallery(State(state): State<Arc<AppState>>) -> Response {
    match state.images().list().await {
        Ok(images) => {
            tracing::debug!(count = images.len(), "Loaded gallery images");
            Json(images).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error loading gallery");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new("Failed to load gallery")),
            )
                .into_response()
        }
    }
}

/// GET /get-images
pub async fn get_images(State(state): State<Arc<AppState>>) -> Response {
    match state.images().list().await {
        Ok(images) => {
            tracing::info!(count = images.len(), "Found images in the uploads folder");
            Json(ImageListResponse {
                images,
                success: true,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error loading images");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ImageListError {
                    error: "Failed to load images".to_string(),
                    success: false,
                }),
            )
                .into_response()
        }
    }
}

/// POST /upload
///
/// Multipart with one or more `images` parts. Each file is processed on its
/// own; the call succeeds when at least one was stored.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Ok(bad_request("No files uploaded"));
    };

    let mut files = Vec::new();
    let mut saw_field = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Malformed upload: {}", e.body_text())))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        saw_field = true;

        let name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::validation(format!("Malformed upload: {}", e.body_text())))?;

        files.push(UploadedFile {
            name,
            data: data.to_vec(),
        });
    }

    if !saw_field {
        return Ok(bad_request("No files uploaded"));
    }

    if files.iter().all(|f| f.name.is_empty()) {
        return Ok(bad_request("No files selected"));
    }

    let outcome = state.images().save_all(files).await;

    if outcome.uploaded.is_empty() && !outcome.errors.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(UploadFailure {
                success: false,
                error: "Upload failed".to_string(),
                errors: outcome.errors,
            }),
        )
            .into_response());
    }

    tracing::info!(
        uploaded = outcome.uploaded.len(),
        rejected = outcome.errors.len(),
        "Upload processed"
    );

    Ok(Json(UploadResponse {
        success: true,
        uploaded_files: outcome.uploaded,
        errors: (!outcome.errors.is_empty()).then_some(outcome.errors),
    })
    .into_response())
}

/// POST /delete-image
pub async fn delete_image(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DeleteImageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::validation("No filename provided"))?;
    let filename = validate_filename(request.filename.as_deref(), "No filename provided")?;

    match state.images().delete(&filename).await {
        Ok(()) => Ok(Json(MessageResponse::success("Image deleted successfully"))),
        Err(ImageError::NotFound(_)) => {
            tracing::warn!(filename = %filename, "File not found for deletion");
            Err(ApiError::NotFound("File not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /rotate-image
///
/// Positive `degrees` rotate clockwise.
pub async fn rotate_image(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RotateImageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = body.map_err(|_| ApiError::validation("No data provided"))?;

    let (Some(filename), Some(degrees)) = (request.filename, request.degrees) else {
        return Err(ApiError::validation("Missing filename or degrees"));
    };
    let filename = validate_filename(Some(&filename), "Missing filename or degrees")?;
    let rotation = validate_rotation(degrees)?;

    match state.images().rotate(&filename, rotation).await {
        Ok(()) => {
            let url = state.images().url_for(&filename);
            Ok(Json(
                MessageResponse::success("Image rotated successfully").with_url(url),
            ))
        }
        Err(ImageError::NotFound(_)) => Err(ApiError::NotFound("Image not found".to_string())),
        Err(e @ ImageError::Processing { .. }) => {
            tracing::error!(error = %e, "Error rotating image");
            Err(ApiError::ProcessingError("Failed to rotate image".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
}
