// src/services/sitemap.rs

//! Sitemap generation and parsing.
//!
//! Entry order is fixed: home, pages (home and not-found excluded), listing,
//! posts. Both collections are `BTreeMap`s so the document is reproducible.

use crate::error::{AppError, Result};
use crate::services::ContentIndex;
use crate::utils::url::encode_segment;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Host and path prefix written in front of every location.
#[derive(Debug, Clone, Default)]
pub struct SitemapOptions {
    /// Scheme and authority, e.g. `https://example.github.io`
    pub host: String,
    /// Path prefix, e.g. `/my-site`
    pub subpath: Option<String>,
}

impl SitemapOptions {
    pub fn new(host: impl Into<String>, subpath: Option<String>) -> Self {
        Self {
            host: host.into(),
            subpath,
        }
    }

    fn prefix(&self) -> String {
        let host = self.host.trim_end_matches('/');
        let subpath = normalize_subpath(self.subpath.as_deref());
        format!("{host}{subpath}")
    }
}

/// Keys that get their own sitemap entries.
#[derive(Debug, Clone)]
pub struct SitemapKeys<'a> {
    pub home_key: &'a str,
    pub not_found_key: &'a str,
}

/// `None`, `""` and `"/"` become empty; otherwise one leading slash and no
/// trailing slash.
pub fn normalize_subpath(subpath: Option<&str>) -> String {
    let trimmed = subpath.unwrap_or("").trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Site-relative paths in sitemap order, keys percent-encoded.
pub fn site_paths(index: &ContentIndex, keys: &SitemapKeys<'_>) -> Vec<String> {
    let listing = encode_segment(index.listing_segment());
    let mut paths = vec!["/".to_string()];

    paths.extend(
        index
            .pages
            .keys()
            .filter(|key| key.as_str() != keys.home_key && key.as_str() != keys.not_found_key)
            .map(|key| format!("/{}", encode_segment(key))),
    );
    paths.push(format!("/{listing}"));
    paths.extend(
        index
            .posts
            .keys()
            .map(|key| format!("/{listing}/{}", encode_segment(key))),
    );

    paths
}

/// Absolute locations in sitemap order.
pub fn site_urls(index: &ContentIndex, keys: &SitemapKeys<'_>, options: &SitemapOptions) -> Vec<String> {
    let prefix = options.prefix();
    site_paths(index, keys)
        .into_iter()
        .map(|path| format!("{prefix}{path}"))
        .collect()
}

/// Build the sitemap document.
pub fn build(index: &ContentIndex, keys: &SitemapKeys<'_>, options: &SitemapOptions) -> String {
    let urls = site_urls(index, keys, options);
    log::debug!("Generating sitemap with {} entries", urls.len());
    render(&urls)
}

/// Serialize locations as a `urlset` document.
pub fn render(urls: &[String]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push('\n');
    xml.push_str(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#));
    xml.push('\n');

    for url in urls {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(url)));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}

/// Parse a sitemap document into its locations, in document order.
pub fn parse(xml: &str) -> Result<Vec<String>> {
    let document = roxmltree::Document::parse(xml).map_err(AppError::sitemap_parse)?;

    let root = document.root_element();
    if root.tag_name().name() != "urlset" {
        return Err(AppError::sitemap_parse(format!(
            "expected <urlset> root, found <{}>",
            root.tag_name().name()
        )));
    }

    let urls = root
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "url")
        .filter_map(|url| {
            url.children()
                .find(|node| node.is_element() && node.tag_name().name() == "loc")
        })
        .filter_map(|loc| loc.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    Ok(urls)
}

/// Escape special XML characters.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::ContentRecord;
    use crate::services::content::parse_record;

    const KEYS: SitemapKeys<'static> = SitemapKeys {
        home_key: "home",
        not_found_key: "404",
    };

    fn collect(items: &[(&str, &str)]) -> BTreeMap<String, ContentRecord> {
        items
            .iter()
            .map(|(k, raw)| (k.to_string(), parse_record(k, raw)))
            .collect()
    }

    fn index(pages: &[(&str, &str)], posts: &[(&str, &str)]) -> ContentIndex {
        ContentIndex::from_parts(collect(pages), collect(posts), "posts").unwrap()
    }

    #[test]
    fn test_home_listing_and_post() {
        let index = index(
            &[("home", "TITLE:Home\n\nHello")],
            &[("hello", "TITLE:Hello\nAUTHOR:Ann\nDATE:2020-01-01\n\nWorld")],
        );

        let xml = build(&index, &KEYS, &SitemapOptions::default());
        let locs = parse(&xml).unwrap();

        assert_eq!(locs, vec!["/", "/posts", "/posts/hello"]);
        assert_eq!(xml.matches("<loc>").count(), 3);
    }

    #[test]
    fn test_order_and_exclusions() {
        let index = index(
            &[("home", ""), ("contact", ""), ("about", ""), ("404", "")],
            &[("b-post", ""), ("a-post", "")],
        );

        let paths = site_paths(&index, &KEYS);

        assert_eq!(
            paths,
            vec![
                "/",
                "/about",
                "/contact",
                "/posts",
                "/posts/a-post",
                "/posts/b-post"
            ]
        );
    }

    #[test]
    fn test_host_and_subpath_override() {
        let index = index(&[("home", ""), ("about", "")], &[("hello", "")]);
        let options = SitemapOptions::new("https://ann.github.io/", Some("blog/".to_string()));

        let locs = parse(&build(&index, &KEYS, &options)).unwrap();

        assert_eq!(
            locs,
            vec![
                "https://ann.github.io/blog/",
                "https://ann.github.io/blog/about",
                "https://ann.github.io/blog/posts",
                "https://ann.github.io/blog/posts/hello",
            ]
        );
    }

    #[test]
    fn test_round_trip_matches_constructed_urls() {
        let index = index(&[("home", ""), ("a&b", "")], &[("x", ""), ("y", "")]);
        let options = SitemapOptions::new("http://localhost:3997", None);

        let expected = site_urls(&index, &KEYS, &options);
        let parsed = parse(&build(&index, &KEYS, &options)).unwrap();

        assert_eq!(parsed, expected);
        assert!(parsed.contains(&"http://localhost:3997/a&b".to_string()));
    }

    #[test]
    fn test_keys_are_percent_encoded() {
        let index = index(&[("home", ""), ("my page", "")], &[("café", "")]);

        let locs = parse(&build(&index, &KEYS, &SitemapOptions::new("http://x", None))).unwrap();

        assert_eq!(
            locs,
            vec![
                "http://x/",
                "http://x/my%20page",
                "http://x/posts",
                "http://x/posts/caf%C3%A9",
            ]
        );
    }

    #[test]
    fn test_normalize_subpath() {
        assert_eq!(normalize_subpath(None), "");
        assert_eq!(normalize_subpath(Some("/")), "");
        assert_eq!(normalize_subpath(Some("site")), "/site");
        assert_eq!(normalize_subpath(Some("/site/")), "/site");
    }

    #[test]
    fn test_parse_rejects_malformed_xml() {
        let err = parse("<urlset><url><loc>/</loc></url>").unwrap_err();
        assert!(matches!(err, AppError::SitemapParse(_)));

        assert!(parse("not xml at all").is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_root() {
        let err = parse("<sitemapindex><sitemap><loc>/a.xml</loc></sitemap></sitemapindex>")
            .unwrap_err();
        assert!(matches!(err, AppError::SitemapParse(_)));
    }

    #[test]
    fn test_parse_empty_urlset() {
        let locs = parse(r#"<?xml version="1.0"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"/>"#)
            .unwrap();
        assert!(locs.is_empty());
    }
}
