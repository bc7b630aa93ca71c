//! HTML content helpers.
//!
//! The backend stores publication content as an HTML string; these
//! helpers scan and build that representation. Scanning uses the same
//! `<img src="...">` pattern the web client used, compiled once.

use std::sync::OnceLock;

use regex::Regex;

fn img_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<img[^>]+src="([^">]+)"[^>]*>"#).expect("hardcoded regex"))
}

/// A piece of an HTML string: either raw markup or an image tag's src.
#[derive(Debug, PartialEq, Eq)]
pub enum Segment {
    Markup(String),
    Image(String),
}

/// Split HTML into markup runs and image srcs, preserving order.
pub fn split_segments(html: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for captures in img_regex().captures_iter(html) {
        let whole = captures.get(0).expect("match has a group 0");
        if whole.start() > last {
            segments.push(Segment::Markup(html[last..whole.start()].to_string()));
        }
        segments.push(Segment::Image(captures[1].to_string()));
        last = whole.end();
    }
    if last < html.len() {
        segments.push(Segment::Markup(html[last..].to_string()));
    }
    segments
}

/// Extract all image URLs from an HTML string, in order.
pub fn extract_images(html: &str) -> Vec<String> {
    img_regex()
        .captures_iter(html)
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Convert plain text to paragraph HTML. Text that already looks like
/// HTML is returned unchanged.
pub fn text_to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"(?i)<[a-z][\s\S]*>").expect("hardcoded regex"));
    if tag.is_match(text) {
        return text.to_string();
    }

    text.split("\n\n")
        .filter(|paragraph| !paragraph.trim().is_empty())
        .map(|paragraph| format!("<p>{}</p>", paragraph.replace('\n', "<br>")))
        .collect()
}

/// Append an image tag to existing HTML content.
pub fn insert_image(html: &str, image_url: &str) -> String {
    if image_url.is_empty() {
        return html.to_string();
    }
    let tag = format!(r#"<img src="{}" alt="">"#, image_url);
    if html.trim().is_empty() {
        format!("<p>{}</p>", tag)
    } else {
        format!("{}<p>{}</p>", html, tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_images_in_order() {
        let html = r#"<p>a</p><img src="https://x/1.png"><p>b</p><img src="https://x/2.png">"#;
        assert_eq!(extract_images(html), vec!["https://x/1.png", "https://x/2.png"]);
    }

    #[test]
    fn extracts_nothing_from_plain_markup() {
        assert!(extract_images("<p>no images here</p>").is_empty());
    }

    #[test]
    fn split_preserves_surrounding_markup() {
        let segments = split_segments(r#"<p>a</p><img src="u"><p>b</p>"#);
        assert_eq!(
            segments,
            vec![
                Segment::Markup("<p>a</p>".to_string()),
                Segment::Image("u".to_string()),
                Segment::Markup("<p>b</p>".to_string()),
            ]
        );
    }

    #[test]
    fn text_to_html_builds_paragraphs() {
        assert_eq!(
            text_to_html("first\nline\n\nsecond"),
            "<p>first<br>line</p><p>second</p>"
        );
    }

    #[test]
    fn text_to_html_leaves_html_alone() {
        assert_eq!(text_to_html("<p>already html</p>"), "<p>already html</p>");
    }

    #[test]
    fn insert_image_into_empty_and_existing_content() {
        assert_eq!(
            insert_image("", "https://x/a.png"),
            r#"<p><img src="https://x/a.png" alt=""></p>"#
        );
        assert_eq!(
            insert_image("<p>text</p>", "https://x/a.png"),
            r#"<p>text</p><p><img src="https://x/a.png" alt=""></p>"#
        );
    }
}
