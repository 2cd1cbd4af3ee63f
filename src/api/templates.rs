//! Server-rendered pages. All dynamic text goes through `html_escape`; scripts
//! live in `/static/js/main.js` so the CSP can keep `script-src 'self'`.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::fmt::Write;

use super::flash::Flash;
use crate::services::ImageEntry;

const SITE_TITLE: &str = "Portfolio";

fn layout(title: &str, body_class: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<link rel="stylesheet" href="/static/css/style.css">
</head>
<body class="{body_class}">
{body}
<script src="/static/js/main.js" defer></script>
</body>
</html>
"#,
        title = text(title),
        body_class = attr(body_class),
    )
}

fn flash_list(flashes: &[Flash]) -> String {
    if flashes.is_empty() {
        return String::new();
    }

    let mut out = String::from(r#"<ul class="flashes">"#);
    for flash in flashes {
        let _ = write!(
            out,
            r#"<li class="flash flash-{}">{}</li>"#,
            attr(&flash.category),
            text(&flash.message)
        );
    }
    out.push_str("</ul>");
    out
}

pub fn index_page(images: &[ImageEntry], flashes: &[Flash], logged_in: bool) -> String {
    let mut gallery = String::new();
    for image in images {
        let _ = write!(
            gallery,
            r#"<figure class="gallery-item"><img src="{url}" alt="{name}" loading="lazy" data-full="{url}"></figure>"#,
            url = attr(&image.url),
            name = attr(&image.filename),
        );
    }
    if images.is_empty() {
        gallery.push_str(r#"<p class="empty">No images yet.</p>"#);
    }

    let account_link = if logged_in {
        r#"<a href="/admin">Admin</a>"#
    } else {
        r#"<a href="/login">Login</a>"#
    };

    let body = format!(
        r##"<header class="site-header">
<h1>{SITE_TITLE}</h1>
<nav><a href="#gallery">Gallery</a> <a href="#about">About</a> <a href="#contact">Contact</a> {account_link}</nav>
</header>
{flashes}
<main>
<section id="gallery">
<h2>Gallery</h2>
<div class="gallery-grid" data-source="/gallery">{gallery}</div>
</section>
<section id="about">
<h2>About</h2>
<p>A selection of recent work.</p>
</section>
<section id="contact">
<h2>Contact</h2>
<form class="contact-form" action="/contact" method="post">
<input type="text" name="name" placeholder="Name" required>
<input type="email" name="email" placeholder="Email" required>
<textarea name="message" placeholder="Message" required></textarea>
<button type="submit">Send</button>
<p class="form-status" role="status"></p>
</form>
</section>
</main>
<div class="modal" id="image-modal" hidden><img alt=""><button type="button" class="modal-close">&times;</button></div>"##,
        flashes = flash_list(flashes),
    );

    layout(SITE_TITLE, "page-index", &body)
}

pub fn login_page(flashes: &[Flash], next: Option<&str>) -> String {
    let action = match next {
        Some(next) if !next.is_empty() => format!("/login?next={}", urlencoding::encode(next)),
        _ => "/login".to_string(),
    };

    let body = format!(
        r#"<main class="auth">
<h1>Login</h1>
{flashes}
<form class="login-form" action="{action}" method="post">
<label>Username <input type="text" name="username" autocomplete="username" required></label>
<label>Password <input type="password" name="password" autocomplete="current-password" required></label>
<button type="submit">Log in</button>
</form>
<p><a href="/">Back to portfolio</a></p>
</main>"#,
        flashes = flash_list(flashes),
        action = attr(&action),
    );

    layout(&format!("Login | {SITE_TITLE}"), "page-login", &body)
}

pub fn admin_page(username: &str, images: &[ImageEntry], flashes: &[Flash]) -> String {
    let mut rows = String::new();
    for image in images {
        let _ = write!(
            rows,
            r#"<li class="admin-image" data-filename="{name}">
<img src="{url}" alt="{name}">
<span class="filename">{label}</span>
<button type="button" class="rotate" data-degrees="-90">Rotate left</button>
<button type="button" class="rotate" data-degrees="90">Rotate right</button>
<button type="button" class="delete">Delete</button>
</li>"#,
            name = attr(&image.filename),
            url = attr(&image.url),
            label = text(&image.filename),
        );
    }

    let body = format!(
        r#"<header class="site-header">
<h1>Admin Panel</h1>
<p>Logged in as <strong>{username}</strong> | <a href="/">View site</a> | <a href="/logout">Logout</a></p>
</header>
{flashes}
<main>
<section>
<h2>Upload</h2>
<form class="upload-form" action="/upload" method="post" enctype="multipart/form-data">
<input type="file" name="images" accept="image/*" multiple>
<button type="submit">Upload</button>
<p class="form-status" role="status"></p>
</form>
</section>
<section>
<h2>Images ({count})</h2>
<ul class="admin-images">{rows}</ul>
</section>
</main>"#,
        username = text(username),
        flashes = flash_list(flashes),
        count = images.len(),
    );

    layout(&format!("Admin | {SITE_TITLE}"), "page-admin", &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        r#"<main class="error">
<h1>Something went wrong</h1>
<p>{}</p>
<p><a href="/">Return home</a></p>
</main>"#,
        text(message)
    );
    layout(&format!("Error | {SITE_TITLE}"), "page-error", &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> ImageEntry {
        ImageEntry {
            filename: name.to_string(),
            url: format!("/static/uploads/{name}"),
        }
    }

    #[test]
    fn index_has_sections() {
        let html = index_page(&[entry("a.jpg")], &[], false);
        assert!(html.contains("<title>Portfolio</title>"));
        for id in ["gallery", "about", "contact"] {
            assert!(html.contains(&format!(r#"id="{id}""#)));
        }
        assert!(html.contains(r#"src="/static/uploads/a.jpg""#));
        assert!(html.contains(r#"href="/login""#));
    }

    #[test]
    fn index_links_admin_when_logged_in() {
        let html = index_page(&[], &[], true);
        assert!(html.contains(r#"href="/admin""#));
        assert!(html.contains("No images yet."));
    }

    #[test]
    fn login_preserves_next() {
        let html = login_page(&[Flash::error("Please log in")], Some("/admin"));
        assert!(html.contains(r#"action="/login?next=%2Fadmin""#));
        assert!(html.contains("flash-error"));
        assert!(html.contains("Please log in"));
    }

    #[test]
    fn admin_escapes_user_content() {
        let html = admin_page("<b>x</b>", &[entry("a\"b.jpg")], &[]);
        assert!(html.contains("Admin Panel"));
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(!html.contains("<b>x</b>"));
        assert!(html.contains(r#"data-filename="a&quot;b.jpg""#));
        assert!(html.contains(r#"name="images""#));
    }

    #[test]
    fn pages_have_no_inline_script() {
        let html = admin_page("admin", &[], &[]);
        assert_eq!(html.matches("<script").count(), 1);
        assert!(!html.contains("onclick"));
    }
}
