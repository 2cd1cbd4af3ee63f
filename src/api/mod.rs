use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{AuthService, ImageStore};
use crate::state::SharedState;

mod assets;
pub mod auth;
mod error;
pub mod flash;
mod images;
mod observability;
mod pages;
mod system;
mod templates;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.shared.images
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth
    }
}

#[must_use]
pub fn create_app_state(shared: Arc<SharedState>) -> Arc<AppState> {
    Arc::new(AppState { shared })
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();

    let expiry = if config.server.session_inactivity_minutes > 0 {
        Expiry::OnInactivity(time::Duration::minutes(
            config.server.session_inactivity_minutes,
        ))
    } else {
        Expiry::OnSessionEnd
    };

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(config.server.secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(expiry);

    let uploads = ServeDir::new(&config.storage.upload_path);

    Router::new()
        .route("/", get(pages::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/gallery", get(images::gallery))
        .route("/contact", post(system::contact))
        .route("/health-check", get(system::health_check))
        .route("/static/js/{file}", get(assets::serve_asset))
        .route("/static/css/{file}", get(assets::serve_asset))
        .merge(protected_pages())
        .merge(protected_api())
        .nest_service(&config.storage.public_prefix, uploads)
        .fallback(pages::not_found)
        .layer(session_layer)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.max_upload_bytes))
        .layer(middleware::from_fn(observability::no_cache_images))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(pages::handle_panic))
        .with_state(state)
}

fn protected_pages() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin", get(pages::admin))
        .route("/logout", get(auth::logout))
        .route_layer(middleware::from_fn(auth::require_login))
}

fn protected_api() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(images::upload))
        .route("/delete-image", post(images::delete_image))
        .route("/rotate-image", post(images::rotate_image))
        .route("/get-images", get(images::get_images))
        .route_layer(middleware::from_fn(auth::require_session))
}
