use axum::{
    body::Body,
    http::{StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use rust_embed::RustEmbed;

use super::pages;

#[derive(RustEmbed)]
#[folder = "assets"]
struct Asset;

/// Serves the bundled stylesheet and script under `/static/`.
pub async fn serve_asset(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches("/static/");

    match Asset::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                Body::from(content.data),
            )
                .into_response()
        }
        None => pages::error_page(StatusCode::NOT_FOUND, "Page not found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundles_frontend_files() {
        assert!(Asset::get("js/main.js").is_some());
        assert!(Asset::get("css/style.css").is_some());
        assert!(Asset::get("uploads/anything.jpg").is_none());
    }
}
