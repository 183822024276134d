//! Hyperlink removal for rendered Markdown
//!
//! Every link construct is replaced by its visible text:
//!
//! - `[text](target)` and `[text](target "title")` become `text`
//! - `![alt](src)` becomes `alt`
//! - `[text][ref]`, `[text][]` and `![alt][ref]` become `text` / `alt`
//! - `[ref]: target` definition lines are dropped
//! - `<https://example.com>` autolinks become the bare address
//!
//! Inline code spans and fenced code blocks are left untouched.

use regex::Regex;
use std::sync::OnceLock;

struct Patterns {
    image: Regex,
    image_ref: Regex,
    inline: Regex,
    reference: Regex,
    definition: Regex,
    autolink: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // Link destinations may contain one level of balanced parentheses
        let target = r"\((?:[^()\n]|\([^()\n]*\))*\)";
        Patterns {
            image: Regex::new(&format!(r"!\[([^\]\n]*)\]{target}")).expect("valid regex"),
            image_ref: Regex::new(r"!\[([^\]\n]*)\]\[[^\]\n]*\]").expect("valid regex"),
            inline: Regex::new(&format!(r"\[([^\]\n]*)\]{target}")).expect("valid regex"),
            reference: Regex::new(r"\[([^\]\n]+)\]\[[^\]\n]*\]").expect("valid regex"),
            definition: Regex::new(r#"^ {0,3}\[[^\]\n]+\]:\s*\S+(?:\s+["'(].*["')])?\s*$"#)
                .expect("valid regex"),
            autolink: Regex::new(r"<((?:https?|ftp)://[^>\s]+|mailto:[^>\s]+)>")
                .expect("valid regex"),
        }
    })
}

/// Remove link markup from a Markdown document, keeping the link text
pub fn strip_links(markdown: &str) -> String {
    let patterns = patterns();
    let mut lines = Vec::new();
    let mut fence: Option<&str> = None;

    for line in markdown.split('\n') {
        let trimmed = line.trim_start();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
            lines.push(line.to_string());
            continue;
        }

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            fence = Some(&trimmed[..3]);
            lines.push(line.to_string());
            continue;
        }

        if patterns.definition.is_match(line) {
            continue;
        }

        lines.push(strip_outside_code_spans(line, patterns));
    }

    lines.join("\n")
}

/// Apply the link rewrites to the parts of a line that are not inside backticks
fn strip_outside_code_spans(line: &str, patterns: &Patterns) -> String {
    if !line.contains('`') {
        return strip_inline(line, patterns);
    }

    let mut out = String::with_capacity(line.len());
    let mut rest = line;

    while let Some(open) = rest.find('`') {
        let ticks = rest[open..].chars().take_while(|c| *c == '`').count();
        let delimiter = &rest[open..open + ticks];
        let after = &rest[open + ticks..];

        match after.find(delimiter) {
            Some(close) => {
                out.push_str(&strip_inline(&rest[..open], patterns));
                out.push_str(&rest[open..open + ticks + close + ticks]);
                rest = &after[close + ticks..];
            }
            None => {
                // Unmatched backticks are literal text
                out.push_str(&strip_inline(&rest[..open + ticks], patterns));
                rest = after;
            }
        }
    }

    out.push_str(&strip_inline(rest, patterns));
    out
}

fn strip_inline(text: &str, patterns: &Patterns) -> String {
    let images = patterns.image.replace_all(text, "${1}").into_owned();
    let mut current = patterns
        .image_ref
        .replace_all(&images, "${1}")
        .into_owned();

    // Nested constructs such as [[a](x)](y) unwrap one level per pass
    loop {
        let unwrapped = patterns.inline.replace_all(&current, "${1}").into_owned();
        let next = patterns
            .reference
            .replace_all(&unwrapped, "${1}")
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }

    patterns.autolink.replace_all(&current, "${1}").into_owned()
}
