use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::any::Any;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::current_user;
use super::{AppState, flash, templates};
use crate::services::AuthError;

/// GET /
///
/// Listing failures degrade to an empty gallery rather than an error page.
pub async fn index(State(state): State<Arc<AppState>>, session: Session) -> Html<String> {
    let images = state.images().list().await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Error loading images");
        Vec::new()
    });

    let logged_in = current_user(&session).await.is_some();
    let flashes = flash::take(&session).await;

    Html(templates::index_page(&images, &flashes, logged_in))
}

/// GET /admin
pub async fn admin(State(state): State<Arc<AppState>>, session: Session) -> Response {
    let Some(username) = current_user(&session).await else {
        return Redirect::to("/login?next=%2Fadmin").into_response();
    };

    let user = match state.auth().get_user_info(&username).await {
        Ok(user) => user,
        Err(AuthError::UserNotFound) => {
            tracing::warn!(username = %username, "Session refers to a removed account");
            if let Err(e) = session.flush().await {
                tracing::warn!(error = %e, "Failed to flush stale session");
            }
            return Redirect::to("/login").into_response();
        }
        Err(e) => {
            tracing::error!(error = %e, "Error in admin route");
            return error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while loading the admin page.",
            );
        }
    };

    match state.images().list_sorted().await {
        Ok(images) => {
            tracing::info!(count = images.len(), "Admin panel loaded");
            let flashes = flash::take(&session).await;
            Html(templates::admin_page(&user.username, &images, &flashes)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Error in admin route");
            error_page(
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred while loading the admin page.",
            )
        }
    }
}

pub async fn not_found() -> Response {
    error_page(StatusCode::NOT_FOUND, "Page not found")
}

pub fn error_page(status: StatusCode, message: &str) -> Response {
    (status, Html(templates::error_page(message))).into_response()
}

/// Last-resort handler for `CatchPanicLayer`.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    tracing::error!(panic = detail, "Request handler panicked");
    error_page(
        StatusCode::INTERNAL_SERVER_ERROR,
        "An unexpected error occurred",
    )
}
