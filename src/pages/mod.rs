//! Server-rendered HTML pages.

use axum::{
    response::Html,
    routing::{get, post},
    Router,
};
use tower_sessions::Session;

use crate::{
    error::AppError,
    session::{self, Flash},
    state::AppState,
};

pub mod handlers;
pub mod views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/about", get(handlers::about))
        .route("/contact", get(handlers::contact))
        .route("/contact_submit", post(handlers::contact_submit))
        .route("/doctors", get(handlers::doctors))
        .route("/health", get(|| async { "ok" }))
}

/// Escape HTML special characters to prevent XSS attacks.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Wraps a page body in the shared layout: navigation, flash notices, footer.
pub fn render(title: &str, username: Option<&str>, flashes: &[Flash], body: &str) -> Html<String> {
    let nav = match username {
        Some(name) => format!(
            r#"<a href="/predict">Predict</a>
            <a href="/history">History</a>
            <a href="/doctors">Doctors</a>
            <span class="whoami">{}</span>
            <a href="/logout">Logout</a>"#,
            html_escape(name)
        ),
        None => r#"<a href="/login">Login</a>
            <a href="/signup">Sign up</a>"#
            .to_string(),
    };

    let notices: String = flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="notice {}">{}</div>"#,
                f.level.css_class(),
                html_escape(&f.message)
            )
        })
        .collect();

    Html(format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} | PneumoScan</title>
    <style>
        body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; margin: 0; background: #f4f7fb; color: #1d2733; }}
        header {{ background: #14365d; padding: 12px 24px; display: flex; gap: 16px; align-items: center; }}
        header a, header span {{ color: #fff; text-decoration: none; }}
        header .brand {{ font-weight: 700; margin-right: auto; }}
        main {{ max-width: 880px; margin: 32px auto; padding: 0 16px; }}
        .notice {{ padding: 10px 14px; border-radius: 6px; margin-bottom: 12px; }}
        .notice-info {{ background: #e3f0ff; }}
        .notice-success {{ background: #e2f7e8; }}
        .notice-warning {{ background: #fff4d6; }}
        .notice-error {{ background: #fde4e4; }}
        .result-positive {{ color: #b3261e; }}
        .result-negative {{ color: #1e7b34; }}
        table {{ width: 100%; border-collapse: collapse; }}
        td, th {{ padding: 8px; border-bottom: 1px solid #d5dde8; text-align: left; }}
        img.scan {{ max-width: 320px; border-radius: 6px; }}
        img.thumb {{ max-width: 96px; }}
        footer {{ text-align: center; color: #6b7a8c; padding: 24px; }}
    </style>
</head>
<body>
    <header>
        <a class="brand" href="/">PneumoScan</a>
        <a href="/about">About</a>
        <a href="/contact">Contact</a>
        {nav}
    </header>
    <main>
        {notices}
        {body}
    </main>
    <footer>Screening aid only. Always consult a qualified clinician.</footer>
</body>
</html>"##,
        title = html_escape(title),
        nav = nav,
        notices = notices,
        body = body,
    ))
}

/// Renders `body` in the layout, draining the session's pending flash notices.
pub async fn respond(
    session: &Session,
    username: Option<&str>,
    title: &str,
    body: &str,
) -> Result<Html<String>, AppError> {
    let flashes = session::take_flashes(session).await?;
    Ok(render(title, username, &flashes, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Level;

    #[test]
    fn test_html_escape_special_chars() {
        assert_eq!(html_escape("hello"), "hello");
        assert_eq!(html_escape("<script>"), "&lt;script&gt;");
        assert_eq!(html_escape("a & b"), "a &amp; b");
        assert_eq!(html_escape("\"quoted\""), "&quot;quoted&quot;");
        assert_eq!(html_escape("it's"), "it&#x27;s");
    }

    #[test]
    fn render_shows_flashes_escaped() {
        let flashes = vec![Flash {
            level: Level::Error,
            message: "<b>bad</b>".into(),
        }];
        let Html(page) = render("Login", None, &flashes, "<p>body</p>");
        assert!(page.contains("notice-error"));
        assert!(page.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(page.contains("<p>body</p>"));
        assert!(page.contains(r#"href="/login""#));
    }

    #[test]
    fn render_nav_depends_on_login() {
        let Html(page) = render("Home", Some("alice"), &[], "");
        assert!(page.contains(r#"href="/logout""#));
        assert!(page.contains("alice"));
        assert!(!page.contains(r#"href="/signup""#));
    }
}
