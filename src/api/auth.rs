use axum::{
    Form,
    extract::{Query, Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tower_sessions::Session;

use super::flash::{self, Flash};
use super::templates;
use super::validation::safe_redirect_target;
use super::{ApiError, AppState, LoginForm, LoginQuery};
use crate::constants::session::USER_KEY;
use crate::services::AuthError;

// ============================================================================
// Middleware
// ============================================================================

/// Guard for page routes: unauthenticated visitors are sent to the login form
/// with the requested path preserved in `next`.
pub async fn require_login(session: Session, request: Request, next: Next) -> Response {
    if let Some(user) = current_user(&session).await {
        tracing::Span::current().record("user_id", user.as_str());
        return next.run(request).await;
    }

    let destination = request
        .uri()
        .path_and_query()
        .map_or("/", |pq| pq.as_str())
        .to_string();

    flash::push(&session, Flash::error("Please log in to access this page.")).await;

    Redirect::to(&format!(
        "/login?next={}",
        urlencoding::encode(&destination)
    ))
    .into_response()
}

/// Guard for JSON routes: unauthenticated requests are rejected with 401.
pub async fn require_session(session: Session, request: Request, next: Next) -> Response {
    if let Some(user) = current_user(&session).await {
        tracing::Span::current().record("user_id", user.as_str());
        return next.run(request).await;
    }

    ApiError::Unauthorized("Authentication required".to_string()).into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /login
pub async fn login_page(session: Session, Query(query): Query<LoginQuery>) -> Response {
    if current_user(&session).await.is_some() {
        return Redirect::to("/admin").into_response();
    }

    let flashes = flash::take(&session).await;
    Html(templates::login_page(&flashes, query.next.as_deref())).into_response()
}

/// POST /login
///
/// Failures re-render the form with 200 and never establish a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Response {
    if current_user(&session).await.is_some() {
        return Redirect::to("/admin").into_response();
    }

    let next = query.next.as_deref();

    if form.username.is_empty() || form.password.is_empty() {
        tracing::warn!("Login attempt with missing username or password");
        return render_login_error(&session, next, "Please provide both username and password")
            .await;
    }

    match state.auth().login(&form.username, &form.password).await {
        Ok(user) => {
            if let Err(e) = establish_session(&session, &user.username).await {
                tracing::error!(error = %e, "Failed to create session");
                return render_login_error(&session, next, "An error occurred. Please try again.")
                    .await;
            }

            tracing::info!(username = %user.username, "User logged in");
            flash::push(&session, Flash::success("Logged in successfully!")).await;

            let target = safe_redirect_target(next).unwrap_or("/admin");
            Redirect::to(target).into_response()
        }
        Err(AuthError::InvalidCredentials) => {
            tracing::warn!(username = %form.username, "Failed login attempt");
            render_login_error(&session, next, "Invalid username or password").await
        }
        Err(e) => {
            tracing::error!(error = %e, "Login failed");
            render_login_error(&session, next, "An error occurred. Please try again.").await
        }
    }
}

/// GET /logout
pub async fn logout(session: Session) -> Redirect {
    if let Err(e) = session.flush().await {
        tracing::warn!(error = %e, "Failed to flush session on logout");
    }
    Redirect::to("/")
}

// ============================================================================
// Helpers
// ============================================================================

/// Resolves the session to the logged-in username, if any.
pub async fn current_user(session: &Session) -> Option<String> {
    session.get::<String>(USER_KEY).await.ok().flatten()
}

async fn establish_session(
    session: &Session,
    username: &str,
) -> Result<(), tower_sessions::session::Error> {
    // New id on privilege change.
    session.cycle_id().await?;
    session.insert(USER_KEY, username).await
}

async fn render_login_error(session: &Session, next: Option<&str>, message: &str) -> Response {
    let mut flashes = flash::take(session).await;
    flashes.push(Flash::error(message));
    Html(templates::login_page(&flashes, next)).into_response()
}
