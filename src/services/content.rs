// src/services/content.rs

//! Content index.
//!
//! Loads the pages and posts directories once and keeps them as immutable
//! key → record maps. A content file is a metadata block, one or more blank
//! lines, then a markdown body:
//!
//! ```text
//! TITLE:Hello
//! AUTHOR:Ann
//! DATE:2020-01-01
//!
//! World
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use pulldown_cmark::{Options, Parser, html as md_html};
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::ContentRecord;

static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").expect("valid separator regex"));
static TITLE: LazyLock<Regex> = LazyLock::new(|| field_pattern("TITLE"));
static AUTHOR: LazyLock<Regex> = LazyLock::new(|| field_pattern("AUTHOR"));
static DATE: LazyLock<Regex> = LazyLock::new(|| field_pattern("DATE"));
static URL: LazyLock<Regex> = LazyLock::new(|| field_pattern("URL"));
static NOMENU: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^NOMENU:1\s*$").expect("valid nomenu regex"));

fn field_pattern(name: &str) -> Regex {
    Regex::new(&format!(r"(?m)^{name}:(.*)$")).expect("valid field regex")
}

/// Immutable index of every page and post, built once at startup.
#[derive(Debug, Clone)]
pub struct ContentIndex {
    pub pages: BTreeMap<String, ContentRecord>,
    pub posts: BTreeMap<String, ContentRecord>,
    listing_segment: String,
}

impl ContentIndex {
    /// Load both collections and reject keys that shadow the listing segment.
    pub fn load(pages_dir: &Path, posts_dir: &Path, listing_segment: &str) -> Result<Self> {
        let pages = load_collection(pages_dir)?;
        let posts = load_collection(posts_dir)?;
        let index = Self::from_parts(pages, posts, listing_segment)?;

        log::info!(
            "Loaded {} pages from {} and {} posts from {}",
            index.pages.len(),
            pages_dir.display(),
            index.posts.len(),
            posts_dir.display()
        );
        Ok(index)
    }

    /// Build an index from already-parsed collections.
    pub fn from_parts(
        pages: BTreeMap<String, ContentRecord>,
        posts: BTreeMap<String, ContentRecord>,
        listing_segment: &str,
    ) -> Result<Self> {
        for (collection, records) in [("page", &pages), ("post", &posts)] {
            if records.contains_key(listing_segment) {
                return Err(AppError::ReservedKey {
                    key: listing_segment.to_string(),
                    collection: collection.to_string(),
                });
            }
        }

        Ok(Self {
            pages,
            posts,
            listing_segment: listing_segment.to_string(),
        })
    }

    pub fn listing_segment(&self) -> &str {
        &self.listing_segment
    }

    pub fn page(&self, key: &str) -> Option<&ContentRecord> {
        self.pages.get(key)
    }

    pub fn post(&self, key: &str) -> Option<&ContentRecord> {
        self.posts.get(key)
    }
}

/// Load every regular file in `dir` into a key → record map.
///
/// Only an unreadable directory fails the load; a malformed file simply ends
/// up with absent fields.
pub fn load_collection(dir: &Path) -> Result<BTreeMap<String, ContentRecord>> {
    let entries = fs::read_dir(dir).map_err(|e| AppError::content_load(dir, e))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| AppError::content_load(dir, e))?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut records = BTreeMap::new();
    for path in files {
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            log::warn!("Skipping content file with non UTF-8 name: {:?}", path);
            continue;
        };
        let bytes = fs::read(&path).map_err(|e| AppError::content_load(&path, e))?;
        let raw = String::from_utf8_lossy(&bytes);
        let record = parse_record(key, &raw);
        log::debug!("Indexed {} as '{}'", path.display(), record.key);
        records.insert(record.key.clone(), record);
    }

    Ok(records)
}

/// Parse one content file. Without a blank-line separator the whole file is
/// metadata and the body is empty.
pub fn parse_record(key: &str, raw: &str) -> ContentRecord {
    let (metadata, body) = match SEPARATOR.find(raw) {
        Some(m) => (&raw[..m.start()], &raw[m.end()..]),
        None => (raw, ""),
    };

    ContentRecord {
        key: key.to_string(),
        title: capture(&TITLE, metadata),
        author: capture(&AUTHOR, metadata),
        date: capture(&DATE, metadata),
        canonical_url: capture(&URL, metadata),
        hide_from_menu: NOMENU.is_match(metadata),
        body: render_markdown(body),
    }
}

fn capture(pattern: &Regex, metadata: &str) -> Option<String> {
    pattern
        .captures(metadata)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Markdown to HTML.
pub fn render_markdown(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH);
    let mut html = String::new();
    md_html::push_html(&mut html, parser);
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_parse_full_metadata() {
        let record = parse_record(
            "hello",
            "TITLE:Hello\nAUTHOR:Ann\nDATE:2020-01-01\nURL:https://example.com/hello\nNOMENU:1\n\nWorld",
        );

        assert_eq!(record.key, "hello");
        assert_eq!(record.title.as_deref(), Some("Hello"));
        assert_eq!(record.author.as_deref(), Some("Ann"));
        assert_eq!(record.date.as_deref(), Some("2020-01-01"));
        assert_eq!(
            record.canonical_url.as_deref(),
            Some("https://example.com/hello")
        );
        assert!(record.hide_from_menu);
        assert_eq!(record.body.trim(), "<p>World</p>");
    }

    #[test]
    fn test_parse_missing_fields() {
        let record = parse_record("about", "TITLE:About\n\n\n\nSome *text*");

        assert_eq!(record.title.as_deref(), Some("About"));
        assert!(record.author.is_none());
        assert!(record.date.is_none());
        assert!(!record.hide_from_menu);
        assert!(record.body.contains("<em>text</em>"));
    }

    #[test]
    fn test_parse_without_separator_is_all_metadata() {
        let record = parse_record("odd", "TITLE:Odd\nThis line is not a body");

        assert_eq!(record.title.as_deref(), Some("Odd"));
        assert!(record.body.is_empty());
    }

    #[test]
    fn test_parse_crlf_and_whitespace_blank_lines() {
        let record = parse_record("win", "TITLE:Windows\r\n  \r\nBody");

        assert_eq!(record.title.as_deref(), Some("Windows"));
        assert_eq!(record.body.trim(), "<p>Body</p>");
    }

    #[test]
    fn test_metadata_only_matches_line_start() {
        let record = parse_record("x", "SUBTITLE:Nope\nNOMENU:10\n\nbody TITLE:Nope");

        assert!(record.title.is_none());
        assert!(!record.hide_from_menu);
    }

    #[test]
    fn test_load_collection_keys_by_stem() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "home.txt", "TITLE:Home\n\nHello");
        write(tmp.path(), "about.md", "TITLE:About\n\nAbout us");
        fs::create_dir(tmp.path().join("drafts")).unwrap();

        let records = load_collection(tmp.path()).unwrap();

        assert_eq!(
            records.keys().collect::<Vec<_>>(),
            vec!["about", "home"]
        );
        assert!(records["home"].body.contains("Hello"));
    }

    #[test]
    fn test_load_collection_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "a.txt", "TITLE:A\n\nalpha");
        write(tmp.path(), "b.txt", "no separator at all");

        let first = load_collection(tmp.path()).unwrap();
        let second = load_collection(tmp.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_load_collection_tolerates_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bin.txt"), b"TITLE:Bin\n\n\xff\xfe").unwrap();

        let records = load_collection(tmp.path()).unwrap();

        assert_eq!(records["bin"].title.as_deref(), Some("Bin"));
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let err = load_collection(&tmp.path().join("missing")).unwrap_err();

        assert!(matches!(err, AppError::ContentLoad { .. }));
    }

    #[test]
    fn test_listing_collision_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let pages = tmp.path().join("pages");
        let posts = tmp.path().join("posts");
        fs::create_dir_all(&pages).unwrap();
        fs::create_dir_all(&posts).unwrap();
        write(&pages, "posts.txt", "TITLE:Clash\n\nbody");

        let err = ContentIndex::load(&pages, &posts, "posts").unwrap_err();

        assert!(matches!(
            err,
            AppError::ReservedKey { ref key, ref collection } if key == "posts" && collection == "page"
        ));
    }
}
