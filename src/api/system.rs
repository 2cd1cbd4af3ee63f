use axum::{Json, extract::rejection::JsonRejection};

use super::{ContactRequest, HealthResponse, MessageResponse};

/// GET /health-check
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /contact
///
/// Acknowledges the message. Nothing is stored or forwarded.
pub async fn contact(body: Result<Json<ContactRequest>, JsonRejection>) -> Json<MessageResponse> {
    let request = body.map(|Json(r)| r).unwrap_or_default();

    tracing::info!(
        name = request.name.as_deref().unwrap_or(""),
        has_email = request.email.is_some(),
        message_len = request.message.as_deref().map_or(0, str::len),
        "Contact message received"
    );

    Json(MessageResponse::success("Message sent successfully"))
}
