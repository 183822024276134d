//! HTML conversion utilities
//!
//! A single-pass tag scanner that turns HTML into Markdown or plain text.
//! It does not build a DOM; unknown tags are dropped and their text kept.

use crate::error::Error;
use crate::types::ContentMode;

/// Elements whose content is never rendered
const SKIP_TAGS: &[&str] = &["script", "style", "noscript", "iframe", "svg", "head", "title"];

/// Converts fetched HTML into the text stored as an artifact
///
/// Implementations must be deterministic for identical input.
pub trait MarkdownRenderer: Send + Sync {
    /// Identifier for logging
    fn name(&self) -> &'static str;

    /// Render the HTML document in the requested mode
    fn render(&self, html: &str, mode: ContentMode) -> Result<String, Error>;
}

/// Built-in renderer backed by [`html_to_markdown`] and [`html_to_text`]
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl MarkdownRenderer for HtmlRenderer {
    fn name(&self) -> &'static str {
        "html"
    }

    fn render(&self, html: &str, mode: ContentMode) -> Result<String, Error> {
        let rendered = match mode {
            ContentMode::FullPage => html_to_markdown(html),
            ContentMode::TextOnly => html_to_text(html),
            ContentMode::HeadingsOnly => headings_only(&html_to_markdown(html)),
        };
        Ok(filter_excessive_newlines(&rendered))
    }
}

/// Check if content is HTML based on content type and body
pub fn is_html(content_type: &Option<String>, body: &str) -> bool {
    // Check Content-Type
    if let Some(ct) = content_type {
        let ct_lower = ct.to_lowercase();
        if ct_lower.contains("text/html") || ct_lower.contains("application/xhtml") {
            return true;
        }
    }

    // Check body start
    let trimmed = body.trim_start();
    let head: String = trimmed.chars().take(15).collect::<String>().to_lowercase();
    head.starts_with("<!doctype html") || head.starts_with("<html")
}

/// Extract the text of the first `<title>` element
pub fn extract_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let open = lower.find("<title")?;
    let content_start = open + lower[open..].find('>')? + 1;
    let content_end = content_start + lower[content_start..].find("</title")?;

    let raw = &html[content_start..content_end];
    let mut decoded = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        decoded.push(decode_entity(c, &mut chars));
    }

    let title = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// A parsed tag: lowercase name and the raw tag source
struct Tag {
    raw: String,
    name: String,
    closing: bool,
    self_closing: bool,
}

/// Read a tag body after `<`, consuming through the closing `>`
fn read_tag(chars: &mut std::iter::Peekable<std::str::Chars>) -> Tag {
    let mut raw = String::new();
    while let Some(next) = chars.next() {
        if next == '>' {
            // Comments may contain '>' and end only at "-->"
            if raw.starts_with("!--") && !raw.ends_with("--") {
                raw.push(next);
                continue;
            }
            break;
        }
        raw.push(next);
    }

    let lower = raw.to_lowercase();
    let closing = lower.starts_with('/');
    let body = if closing { &lower[1..] } else { lower.as_str() };
    let name = body
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or("")
        .to_string();
    let self_closing = raw.trim_end().ends_with('/');

    Tag {
        raw,
        name,
        closing,
        self_closing,
    }
}

/// Track script/style-like elements; returns true when the tag was consumed
fn track_skip(tag: &Tag, skip_elements: &mut Vec<String>) -> bool {
    if !SKIP_TAGS.contains(&tag.name.as_str()) {
        return false;
    }
    if tag.closing {
        if let Some(pos) = skip_elements.iter().rposition(|t| *t == tag.name) {
            skip_elements.remove(pos);
        }
    } else if !tag.self_closing {
        skip_elements.push(tag.name.clone());
    }
    true
}

/// Convert HTML to markdown
pub fn html_to_markdown(html: &str) -> String {
    let mut output = String::new();
    let mut skip_elements: Vec<String> = Vec::new();
    let mut links: Vec<Option<String>> = Vec::new();
    let mut list_depth: usize = 0;
    let mut in_pre = false;
    let mut in_blockquote = false;

    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let tag = read_tag(&mut chars);

            if track_skip(&tag, &mut skip_elements) || !skip_elements.is_empty() {
                continue;
            }

            let is_closing = tag.closing;
            match tag.name.as_str() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                    if !is_closing {
                        let level = tag.name[1..].parse::<usize>().unwrap_or(1);
                        output.push('\n');
                        output.push_str(&"#".repeat(level));
                        output.push(' ');
                    } else {
                        output.push_str("\n\n");
                    }
                }
                "p" | "div" | "section" | "article" | "main" | "header" | "footer" | "nav"
                | "table" | "tr" => {
                    if is_closing {
                        output.push_str("\n\n");
                    }
                }
                "td" | "th" => {
                    if is_closing {
                        output.push(' ');
                    }
                }
                "br" => {
                    output.push('\n');
                }
                "hr" => {
                    output.push_str("\n---\n");
                }
                "ul" | "ol" => {
                    if is_closing {
                        list_depth = list_depth.saturating_sub(1);
                        if list_depth == 0 {
                            output.push('\n');
                        }
                    } else {
                        list_depth += 1;
                    }
                }
                "li" => {
                    if !is_closing {
                        output.push('\n');
                        for _ in 0..list_depth.saturating_sub(1) {
                            output.push_str("  ");
                        }
                        output.push_str("- ");
                    }
                }
                "strong" | "b" => {
                    output.push_str("**");
                }
                "em" | "i" => {
                    output.push('*');
                }
                "pre" => {
                    output.push_str("\n```\n");
                    in_pre = !is_closing;
                }
                "code" => {
                    if !in_pre {
                        output.push('`');
                    }
                }
                "blockquote" => {
                    if !is_closing {
                        in_blockquote = true;
                        output.push_str("\n> ");
                    } else {
                        in_blockquote = false;
                        output.push('\n');
                    }
                }
                "a" => {
                    if !is_closing {
                        let href = extract_attribute(&tag.raw, "href");
                        if href.is_some() {
                            output.push('[');
                        }
                        links.push(href);
                    } else if let Some(Some(href)) = links.pop() {
                        output.push_str(&format!("]({})", href));
                    }
                }
                "img" => {
                    if let Some(src) = extract_attribute(&tag.raw, "src") {
                        let alt = extract_attribute(&tag.raw, "alt").unwrap_or_default();
                        output.push_str(&format!("![{}]({})", alt, src));
                    }
                }
                _ => {}
            }
        } else if skip_elements.is_empty() {
            // Text content
            let decoded = decode_entity(c, &mut chars);
            if in_blockquote && decoded == '\n' {
                output.push_str("\n> ");
            } else {
                output.push(decoded);
            }
        }
    }

    clean_whitespace(&output)
}

/// Convert HTML to plain text
pub fn html_to_text(html: &str) -> String {
    let mut output = String::new();
    let mut skip_elements: Vec<String> = Vec::new();

    let mut chars = html.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '<' {
            let tag = read_tag(&mut chars);

            if track_skip(&tag, &mut skip_elements) || !skip_elements.is_empty() {
                continue;
            }

            // Handle newline-inducing elements
            let newline_tags = [
                "p", "div", "br", "h1", "h2", "h3", "h4", "h5", "h6", "li", "tr",
            ];
            let name = tag.name.as_str();
            if newline_tags.contains(&name) && (tag.closing || name == "br") {
                output.push('\n');
            } else if !tag.closing
                && matches!(name, "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "p")
            {
                output.push('\n');
            }
        } else if skip_elements.is_empty() {
            let decoded = decode_entity(c, &mut chars);
            output.push(decoded);
        }
    }

    clean_whitespace(&output)
}

/// Keep only ATX heading lines of a Markdown document
pub fn headings_only(markdown: &str) -> String {
    markdown
        .lines()
        .map(str::trim)
        .filter(|line| {
            let hashes = line.chars().take_while(|c| *c == '#').count();
            (1..=6).contains(&hashes) && line[hashes..].starts_with(' ')
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Extract attribute value from tag
fn extract_attribute(tag: &str, attr: &str) -> Option<String> {
    let pattern = format!("{}=", attr);
    let tag_lower = tag.to_ascii_lowercase();

    // Require a word boundary so "data-href=" does not match "href="
    let start = tag_lower.match_indices(&pattern).find_map(|(idx, _)| {
        let boundary = idx == 0
            || tag_lower[..idx]
                .chars()
                .next_back()
                .is_some_and(char::is_whitespace);
        boundary.then_some(idx)
    })?;

    let rest = &tag[start + pattern.len()..];
    let rest = rest.trim_start();

    if let Some(rest) = rest.strip_prefix('"') {
        rest.find('"').map(|end| rest[..end].to_string())
    } else if let Some(rest) = rest.strip_prefix('\'') {
        rest.find('\'').map(|end| rest[..end].to_string())
    } else {
        let end = rest
            .find(|c: char| c.is_whitespace() || c == '>')
            .unwrap_or(rest.len());
        Some(rest[..end].trim_end_matches('/').to_string())
    }
}

/// Decode HTML entity starting from ampersand
fn decode_entity(c: char, chars: &mut std::iter::Peekable<std::str::Chars>) -> char {
    if c != '&' {
        return c;
    }

    // Look ahead without consuming until the entity is known to be well formed
    let lookahead: String = chars.clone().take(12).collect();
    let Some(end) = lookahead.find(';') else {
        return '&';
    };
    let entity = &lookahead[..end];
    if entity.is_empty() || entity.chars().any(char::is_whitespace) {
        return '&';
    }

    let decoded = match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some(' '),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        "copy" => Some('©'),
        "reg" => Some('®'),
        _ => entity.strip_prefix('#').and_then(|num| {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => num.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
        }),
    };

    match decoded {
        Some(ch) => {
            for _ in 0..=entity.chars().count() {
                chars.next();
            }
            ch
        }
        // Unknown entity - keep the ampersand, the rest is emitted as text
        None => '&',
    }
}

/// Clean whitespace: collapse runs, trim, keep max 2 newlines
pub fn clean_whitespace(s: &str) -> String {
    let mut result = String::new();
    let mut last_was_space = false;
    let mut newline_count = 0;

    for c in s.chars() {
        if c == '\n' {
            // Remove trailing space before newline
            if last_was_space && result.ends_with(' ') {
                result.pop();
            }
            newline_count += 1;
            last_was_space = true;
            if newline_count <= 2 {
                result.push(c);
            }
        } else if c.is_whitespace() {
            newline_count = 0;
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            newline_count = 0;
            last_was_space = false;
            result.push(c);
        }
    }

    result.trim().to_string()
}

/// Filter excessive newlines: keep at most 2 consecutive newlines
pub fn filter_excessive_newlines(s: &str) -> String {
    let mut result = String::new();
    let mut newline_count = 0;

    for c in s.chars() {
        if c == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push(c);
            }
        } else {
            newline_count = 0;
            result.push(c);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_html_by_content_type() {
        assert!(is_html(&Some("text/html".to_string()), ""));
        assert!(is_html(&Some("text/html; charset=utf-8".to_string()), ""));
        assert!(is_html(&Some("application/xhtml+xml".to_string()), ""));
        assert!(!is_html(&Some("text/plain".to_string()), ""));
        assert!(!is_html(&Some("application/json".to_string()), ""));
    }

    #[test]
    fn test_is_html_by_body() {
        assert!(is_html(&None, "<!DOCTYPE html><html>"));
        assert!(is_html(&None, "  <!doctype html>"));
        assert!(is_html(&None, "<html><body>"));
        assert!(!is_html(&None, "Hello world"));
        assert!(!is_html(&None, "{\"json\": true}"));
    }

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title> Rust &amp; Markdown\n Guide </title></head></html>";
        assert_eq!(extract_title(html), Some("Rust & Markdown Guide".to_string()));
        assert_eq!(extract_title("<p>No title</p>"), None);
        assert_eq!(extract_title("<title>   </title>"), None);
    }

    #[test]
    fn test_html_to_markdown_headers() {
        let html = "<h1>Title</h1><h2>Subtitle</h2><h6>Deep</h6>";
        let md = html_to_markdown(html);
        assert!(md.contains("# Title"));
        assert!(md.contains("## Subtitle"));
        assert!(md.contains("###### Deep"));
    }

    #[test]
    fn test_html_to_markdown_paragraphs() {
        let html = "<p>First paragraph</p><p>Second paragraph</p>";
        let md = html_to_markdown(html);
        assert_eq!(md, "First paragraph\n\nSecond paragraph");
    }

    #[test]
    fn test_html_to_markdown_lists() {
        let html = "<ul><li>Item 1</li><li>Item 2</li></ul>";
        let md = html_to_markdown(html);
        assert!(md.contains("- Item 1"));
        assert!(md.contains("- Item 2"));
    }

    #[test]
    fn test_html_to_markdown_emphasis() {
        let html = "<p><strong>bold</strong> and <em>italic</em></p>";
        let md = html_to_markdown(html);
        assert!(md.contains("**bold**"));
        assert!(md.contains("*italic*"));
    }

    #[test]
    fn test_html_to_markdown_links() {
        let md = html_to_markdown("<a href=\"/x\">Link</a> text");
        assert_eq!(md, "[Link](/x) text");

        let md = html_to_markdown("<p>See <a class='c' href='https://e.com/a'>docs</a>.</p>");
        assert_eq!(md, "See [docs](https://e.com/a).");
    }

    #[test]
    fn test_html_to_markdown_anchor_without_href() {
        let md = html_to_markdown("<a name=\"top\">Top</a>");
        assert_eq!(md, "Top");
    }

    #[test]
    fn test_html_to_markdown_images() {
        let md = html_to_markdown("<img src=\"/logo.png\" alt=\"Logo\"/>");
        assert_eq!(md, "![Logo](/logo.png)");
    }

    #[test]
    fn test_html_to_markdown_code() {
        let html = "<pre>code block</pre><p>use <code>cargo</code></p>";
        let md = html_to_markdown(html);
        assert!(md.contains("```\ncode block\n```"));
        assert!(md.contains("`cargo`"));
    }

    #[test]
    fn test_html_to_markdown_skip_script_and_head() {
        let html = "<html><head><title>T</title><style>p{}</style></head>\
                    <body><p>Before</p><script>alert('bad');</script><p>After</p></body></html>";
        let md = html_to_markdown(html);
        assert!(md.contains("Before"));
        assert!(md.contains("After"));
        assert!(!md.contains("alert"));
        assert!(!md.contains("p{}"));
        assert!(!md.starts_with('T'));
    }

    #[test]
    fn test_html_to_markdown_comments() {
        let md = html_to_markdown("<p>a<!-- x > y -->b</p>");
        assert_eq!(md, "ab");
    }

    #[test]
    fn test_html_to_text_simple() {
        let html = "<p>Hello</p><p>World <a href=\"/x\">link</a></p>";
        let text = html_to_text(html);
        assert!(text.contains("Hello"));
        assert!(text.contains("World link"));
        assert!(!text.contains("]("));
    }

    #[test]
    fn test_html_to_text_skip_script() {
        let html = "<p>Before</p><script>alert('bad');</script><p>After</p>";
        let text = html_to_text(html);
        assert!(text.contains("Before"));
        assert!(text.contains("After"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn test_headings_only() {
        let md = "# Title\n\nBody text\n\n## Section\n\n#hashtag\n\n- item";
        assert_eq!(headings_only(md), "# Title\n\n## Section");
    }

    #[test]
    fn test_renderer_modes() {
        let html = "<h1>Guide</h1><p>Read <a href=\"/more\">more</a></p>";
        let renderer = HtmlRenderer::new();

        let full = renderer.render(html, ContentMode::FullPage).unwrap();
        assert!(full.contains("# Guide"));
        assert!(full.contains("[more](/more)"));

        let text = renderer.render(html, ContentMode::TextOnly).unwrap();
        assert!(text.contains("Guide"));
        assert!(!text.contains('#'));

        let headings = renderer.render(html, ContentMode::HeadingsOnly).unwrap();
        assert_eq!(headings, "# Guide");
    }

    #[test]
    fn test_entity_decoding() {
        let html = "<p>&amp; &lt; &gt; &quot; &apos; &nbsp; &mdash; &ndash; &copy; &reg; &#65; &#x42;</p>";
        let text = html_to_text(html);
        assert!(text.contains('&'));
        assert!(text.contains('<'));
        assert!(text.contains('>'));
        assert!(text.contains('"'));
        assert!(text.contains('\''));
        assert!(text.contains('—'));
        assert!(text.contains('–'));
        assert!(text.contains('©'));
        assert!(text.contains('®'));
        assert!(text.contains('A'));
        assert!(text.contains('B'));
    }

    #[test]
    fn test_unknown_entity_kept_verbatim() {
        assert_eq!(html_to_text("<p>Tom & Jerry &bogus;</p>"), "Tom & Jerry &bogus;");
    }

    #[test]
    fn test_filter_excessive_newlines() {
        let input = "line1\n\n\n\n\nline2";
        let output = filter_excessive_newlines(input);
        assert_eq!(output, "line1\n\nline2");
    }

    #[test]
    fn test_clean_whitespace() {
        let input = "  hello   world  \n\n\n\n  test  ";
        let output = clean_whitespace(input);
        assert_eq!(output, "hello world\n\ntest");
    }

    #[test]
    fn test_extract_attribute() {
        assert_eq!(
            extract_attribute("a href=\"https://example.com\" class=\"link\"", "href"),
            Some("https://example.com".to_string())
        );
        assert_eq!(
            extract_attribute("img src='image.png'", "src"),
            Some("image.png".to_string())
        );
        assert_eq!(
            extract_attribute("div class=test", "class"),
            Some("test".to_string())
        );
        assert_eq!(
            extract_attribute("a data-href=\"/no\" href=\"/yes\"", "href"),
            Some("/yes".to_string())
        );
    }
}
