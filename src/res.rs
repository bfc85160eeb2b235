use axum::{debug_handler, http::header, response::IntoResponse};
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

#[macro_export]
macro_rules! include_res {
    (bytes, $p:expr) => {
        include_bytes!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
    (str, $p:expr) => {
        include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/res", $p))
    };
}

#[debug_handler]
pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], include_res!(str, "/style.css"))
}

#[debug_handler]
pub async fn default_avatar() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], include_res!(str, "/avatar.svg"))
}

/// Whether a link target may be emitted as-is: http(s), mailto, or a relative URL.
fn is_safe_url(url: &str) -> bool {
    let scheme_end = url.find([':', '/', '?', '#']);
    match scheme_end {
        Some(i) if url[i..].starts_with(':') => {
            let scheme = url[..i].to_ascii_lowercase();
            matches!(scheme.as_str(), "http" | "https" | "mailto")
        }
        _ => true,
    }
}

fn sanitize(url: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&url) { url } else { CowStr::Borrowed("#") }
}

/// Renders a message body as Markdown. Raw HTML in the source is shown as text
/// and link or image targets with other schemes are replaced by `#`.
pub fn markdown(source: &str) -> String {
    let parser = Parser::new_ext(source, Options::ENABLE_STRIKETHROUGH)
        .map(|event| match event {
            Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
            Event::Start(Tag::Link { link_type, dest_url, title, id }) => {
                Event::Start(Tag::Link { link_type, dest_url: sanitize(dest_url), title, id })
            }
            Event::Start(Tag::Image { link_type, dest_url, title, id }) => {
                Event::Start(Tag::Image { link_type, dest_url: sanitize(dest_url), title, id })
            }
            _ => event,
        });

    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output
}
