mod common;

use axum::http::{StatusCode, header};
use common::{TestApp, body_json, body_text, location, session_cookie};
use serde_json::json;

#[tokio::test]
async fn health_check_reports_ok() {
    let app = TestApp::spawn().await;

    let response = app.get("/health-check", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn home_page_renders_portfolio() {
    let app = TestApp::spawn().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("content-security-policy"));

    let html = body_text(response).await;
    assert!(html.contains("Portfolio"));
    assert!(html.contains(r#"id="gallery""#));
    assert!(html.contains(r#"id="contact""#));
}

#[tokio::test]
async fn gallery_is_empty_on_fresh_install() {
    let app = TestApp::spawn().await;

    let response = app.get("/gallery", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn admin_redirects_anonymous_visitor_to_login() {
    let app = TestApp::spawn().await;

    let response = app.get("/admin", None).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/login?next=%2Fadmin");

    let cookie = session_cookie(&response).expect("flash should create a session");
    let html = body_text(app.get("/login?next=%2Fadmin", Some(&cookie)).await).await;
    assert!(html.contains("Please log in to access this page."));
    assert!(html.contains(r#"action="/login?next=%2Fadmin""#));

    // Flashes are shown once.
    let html = body_text(app.get("/login", Some(&cookie)).await).await;
    assert!(!html.contains("Please log in to access this page."));
}

#[tokio::test]
async fn protected_api_rejects_anonymous_requests() {
    let app = TestApp::spawn().await;

    let response = app.get("/get-images", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "success": false, "message": "Authentication required" })
    );

    let response = app
        .post_json("/delete-image", None, &json!({ "filename": "a.jpg" }))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_wrong_password_rerenders_form() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/login", None, "username=admin&password=nope")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    let html = body_text(response).await;
    assert!(html.contains("Invalid username or password"));

    let response = app.get("/admin", cookie.as_deref()).await;
    assert!(response.status().is_redirection());
    assert!(location(&response).starts_with("/login"));
}

#[tokio::test]
async fn login_with_missing_fields_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_form("/login", None, "username=admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Please provide both username and password"));
}

#[tokio::test]
async fn login_grants_access_to_admin_panel() {
    let app = TestApp::spawn().await;
    let cookie = app.login().await;

    let response = app.get("/admin", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Admin Panel"));
    assert!(html.contains("Logged in as <strong>admin</strong>"));
    assert!(html.contains("Logged in successfully!"));

    // Already logged in: the login page forwards to the panel.
    let response = app.get("/login", Some(&cookie)).await;
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn login_follows_local_next_only() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/login?next=%2Fadmin%3Fview%3Dall",
            None,
            "username=admin&password=admin123",
        )
        .await;
    assert_eq!(location(&response), "/admin?view=all");

    let response = app
        .post_form(
            "/login?next=https%3A%2F%2Fevil.example",
            None,
            "username=admin&password=admin123",
        )
        .await;
    assert_eq!(location(&response), "/admin");

    let response = app
        .post_form(
            "/login?next=%2F%2Fevil.example",
            None,
            "username=admin&password=admin123",
        )
        .await;
    assert_eq!(location(&response), "/admin");
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::spawn().await;
    let cookie = app.login().await;

    let response = app.get("/logout", Some(&cookie)).await;
    assert!(response.status().is_redirection());
    assert_eq!(location(&response), "/");

    let response = app.get("/admin", Some(&cookie)).await;
    assert!(response.status().is_redirection());
    assert!(location(&response).starts_with("/login"));
}

#[tokio::test]
async fn contact_acknowledges_message() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json(
            "/contact",
            None,
            &json!({ "name": "Sam", "email": "sam@example.com", "message": "Hello" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "success": true, "message": "Message sent successfully" })
    );
}

#[tokio::test]
async fn unknown_route_renders_error_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/does-not-exist", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let html = body_text(response).await;
    assert!(html.contains("Page not found"));
}

#[tokio::test]
async fn bundled_assets_are_served() {
    let app = TestApp::spawn().await;

    let response = app.get("/static/js/main.js", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("javascript"));

    let response = app.get("/static/css/style.css", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
