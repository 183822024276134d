//! Artifact names derived from source URLs
//!
//! Names are human readable: the last path segment of the URL, sanitized,
//! with a `.md` extension. Distinct URLs may map to the same name (for example
//! `https://a.example/docs/` and `https://b.example/`, which both become
//! `index.md`); the store keeps whichever write completed last. Within a
//! batch pages convert concurrently, so that is completion order rather
//! than request order.

use url::Url;

/// Name used when a URL has no usable path segment
pub const INDEX_NAME: &str = "index";

/// Extension of every stored artifact
pub const ARTIFACT_EXTENSION: &str = ".md";

const MAX_STEM_LEN: usize = 200;

/// Derive the artifact filename for a URL
pub fn derive_filename(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let decoded = percent_decode(segment);
    let mut stem = sanitize(&decoded);
    if stem.is_empty() {
        stem = INDEX_NAME.to_string();
    }

    format!("{stem}{ARTIFACT_EXTENSION}")
}

/// Check that a client-supplied name addresses a file directly inside the store
pub fn validate_filename(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("filename must not be empty".to_string());
    }
    if name.contains(['/', '\\', '\0']) || name.contains("..") {
        return Err(format!("invalid filename: {name:?}"));
    }
    if name.starts_with('.') {
        return Err(format!("invalid filename: {name:?}"));
    }
    Ok(())
}

/// Append the artifact extension when the caller left it off
pub fn with_extension(name: &str) -> String {
    if name.ends_with(ARTIFACT_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{ARTIFACT_EXTENSION}")
    }
}

fn sanitize(segment: &str) -> String {
    let replaced: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // ".." and hidden-file names never survive; a trailing dot would
    // form ".." with the extension
    let mut stem: String = replaced.chars().take(MAX_STEM_LEN).collect();
    while stem.contains("..") {
        stem = stem.replace("..", ".");
    }
    stem.trim_matches('.').to_string()
}

fn percent_decode(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let decoded = std::str::from_utf8(&bytes[i + 1..i + 3])
                .ok()
                .and_then(|hex| u8::from_str_radix(hex, 16).ok());
            if let Some(byte) = decoded {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}
