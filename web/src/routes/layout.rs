use actix_web::http::header::ContentType;
use actix_web::HttpResponse;
use actix_web_flash_messages::{IncomingFlashMessages, Level};
use std::fmt::Write;

/// Wraps `body` in the site chrome. `body` must already be escaped.
pub fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Newsletter</title>
    <link rel="stylesheet" href="/css/site.css">
</head>
<body>
<header>
    <nav>
        <a href="/">Home</a>
        <a href="/Newsletter/Subscribe">Subscribe</a>
        <a href="/Newsletter/Subscribers">Subscribers</a>
        <a href="/Newsletter/Unsubscribe">Unsubscribe</a>
        <a href="/Home/Privacy">Privacy</a>
    </nav>
</header>
<main>
{body}
</main>
<footer>
    <p>&copy; Newsletter</p>
</footer>
</body>
</html>"#,
        title = escape(title),
        body = body,
    )
}

pub fn html_response(title: &str, body: &str) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(page(title, body))
}

pub fn flash_messages_html(flash_messages: &IncomingFlashMessages) -> String {
    let mut html = String::new();
    for m in flash_messages.iter() {
        let class = match m.level() {
            Level::Success => "success",
            Level::Error | Level::Warning => "error",
            _ => "info",
        };
        // Writing into a String cannot fail.
        let _ = writeln!(
            html,
            r#"<p class="flash {}"><i>{}</i></p>"#,
            class,
            escape(m.content())
        );
    }
    html
}

pub fn escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}
