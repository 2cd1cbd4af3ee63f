#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use folio::config::Config;
use http_body_util::BodyExt;
use std::io::Cursor;
use std::path::PathBuf;
use tower::ServiceExt;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin123";
pub const BOUNDARY: &str = "folio-test-boundary";

pub struct TestApp {
    pub router: Router,
    pub upload_dir: PathBuf,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let id = uuid::Uuid::new_v4();
        let upload_dir = std::env::temp_dir().join(format!("folio-test-uploads-{id}"));
        let db_path = std::env::temp_dir().join(format!("folio-test-{id}.db"));

        let mut config = Config::default();
        config.general.database_path = format!("sqlite:{}", db_path.display());
        config.storage.upload_path = upload_dir.to_string_lossy().into_owned();
        config.server.secure_cookies = false;
        config.security.argon2_memory_cost_kib = 1024;
        config.security.argon2_time_cost = 1;

        let state = folio::api::create_app_state_from_config(config)
            .await
            .expect("Failed to create app state");

        Self {
            router: folio::api::router(state),
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        cookie: Option<&str>,
        body: &serde_json::Value,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, form: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(form.to_string())).unwrap())
            .await
    }

    /// Logs in as the seeded administrator and returns the session cookie.
    pub async fn login(&self) -> String {
        let response = self
            .post_form(
                "/login",
                None,
                &format!("username={ADMIN_USER}&password={ADMIN_PASSWORD}"),
            )
            .await;
        assert!(response.status().is_redirection());
        session_cookie(&response).expect("login should set a session cookie")
    }

    pub async fn upload(&self, cookie: Option<&str>, files: &[(&str, &[u8])]) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(multipart_body(files))).unwrap())
            .await
    }
}

pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.split(';').next())
        .map(str::to_string)
        .last()
}

pub fn location<B>(response: &Response<B>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Builds a `multipart/form-data` body with one `images` part per file.
pub fn multipart_body(files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, data) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn solid_image(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        width,
        height,
        image::Rgb([200, 30, 30]),
    ));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}
