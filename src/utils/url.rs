// src/utils/url.rs

//! URL manipulation utilities.

use std::borrow::Cow;
use std::path::{Component, Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use url::Url;

use crate::error::{AppError, Result};

/// Bytes escaped inside a single path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Percent-encode one path segment (a content key).
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Decode one percent-encoded path segment. Invalid UTF-8 is replaced.
pub fn decode_segment(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment).decode_utf8_lossy()
}

/// Map a crawled URL to its file path inside the output tree.
///
/// The server base is stripped (falling back to the URL's own path when the
/// URL lives elsewhere), segments are percent-decoded and `index.html` is
/// appended, so `/` becomes `index.html` and `/posts/hello` becomes
/// `posts/hello/index.html`.
///
/// # Examples
/// ```
/// use std::path::PathBuf;
/// use blip::utils::url::output_path_for;
///
/// assert_eq!(
///     output_path_for("http://localhost:3997/about", "http://localhost:3997").unwrap(),
///     PathBuf::from("about/index.html")
/// );
/// ```
pub fn output_path_for(url: &str, base: &str) -> Result<PathBuf> {
    let base = base.trim_end_matches('/');
    let path = match url.strip_prefix(base) {
        Some(rest) if rest.is_empty() || rest.starts_with(['/', '?', '#']) => rest.to_string(),
        _ => Url::parse(url)?.path().to_string(),
    };
    let path = path.split(['?', '#']).next().unwrap_or("");

    let mut output = PathBuf::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let segment = decode_segment(segment);
        if segment == "." || segment == ".." || segment.contains(['/', '\\']) {
            return Err(AppError::validation(format!(
                "URL {url} maps outside the output directory"
            )));
        }
        output.push(segment.as_ref());
    }

    output.push("index.html");
    Ok(output)
}

/// True when the relative path cannot escape its root.
pub fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|component| matches!(component, Component::Normal(_)))
}

/// Join a site-relative path onto a base URL.
pub fn join(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
