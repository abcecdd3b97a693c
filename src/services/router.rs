// src/services/router.rs

//! Request path resolution.

use std::borrow::Cow;

use crate::models::{RouteDecision, RouteKind};
use crate::services::ContentIndex;
use crate::utils::url::decode_segment;

/// Resolve a request path against the index.
///
/// `/` maps to the home key. Otherwise the final segment, percent-decoded,
/// decides: the listing segment wins, then a page whose key equals the full
/// segment, then a post whose key equals the segment without its extension.
/// Directly under the listing segment posts are tried before pages, so a post
/// sharing a page's key stays reachable at its sitemap location.
pub fn resolve(path: &str, index: &ContentIndex, home_key: &str) -> RouteDecision {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let segments: Vec<Cow<'_, str>> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(decode_segment)
        .collect();

    let Some(segment) = segments.last().map(|s| &**s) else {
        return RouteDecision::new(RouteKind::Home, Some(home_key.to_string()));
    };

    if segment == index.listing_segment() {
        return RouteDecision::new(RouteKind::Listing, None);
    }

    let under_listing =
        segments.len() >= 2 && segments[segments.len() - 2] == index.listing_segment();
    if under_listing {
        if let Some(decision) = match_post(segment, index) {
            return decision;
        }
    }

    if index.page(segment).is_some() {
        return RouteDecision::new(RouteKind::Page, Some(segment.to_string()));
    }

    match_post(segment, index).unwrap_or_else(RouteDecision::not_found)
}

fn match_post(segment: &str, index: &ContentIndex) -> Option<RouteDecision> {
    let stem = strip_extension(segment);
    index
        .post(stem)
        .map(|_| RouteDecision::new(RouteKind::Post, Some(stem.to_string())))
}

fn strip_extension(segment: &str) -> &str {
    match segment.rfind('.') {
        Some(idx) if idx > 0 => &segment[..idx],
        _ => segment,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::services::content::parse_record;

    fn index() -> ContentIndex {
        let pages: BTreeMap<_, _> = [
            ("home", "TITLE:Home\n\nHello"),
            ("about", "TITLE:About\n\nUs"),
            ("404", "TITLE:Lost\n\nNothing here"),
            ("my page", "TITLE:Spaced\n\nGaps"),
        ]
        .into_iter()
        .map(|(k, raw)| (k.to_string(), parse_record(k, raw)))
        .collect();
        let posts: BTreeMap<_, _> = [
            ("hello", "TITLE:Hello\nAUTHOR:Ann\n\nWorld"),
            ("café", "TITLE:Coffee\n\nBlack"),
            ("about", "TITLE:About the blog\n\nA post"),
        ]
        .into_iter()
        .map(|(k, raw)| (k.to_string(), parse_record(k, raw)))
        .collect();
        ContentIndex::from_parts(pages, posts, "posts").unwrap()
    }

    #[test]
    fn test_root_is_home() {
        let decision = resolve("/", &index(), "home");
        assert_eq!(decision.kind, RouteKind::Home);
        assert_eq!(decision.matched_key.as_deref(), Some("home"));
        assert_eq!(decision.status(), 200);

        assert_eq!(resolve("", &index(), "home").kind, RouteKind::Home);
        assert_eq!(resolve("/?utm=1", &index(), "home").kind, RouteKind::Home);
    }

    #[test]
    fn test_page_and_post() {
        let index = index();

        let page = resolve("/about", &index, "home");
        assert_eq!(page.kind, RouteKind::Page);
        assert_eq!(page.matched_key.as_deref(), Some("about"));

        let post = resolve("/posts/hello", &index, "home");
        assert_eq!(post.kind, RouteKind::Post);
        assert_eq!(post.matched_key.as_deref(), Some("hello"));

        let with_ext = resolve("/posts/hello.html", &index, "home");
        assert_eq!(with_ext.kind, RouteKind::Post);

        let trailing = resolve("/about/", &index, "home");
        assert_eq!(trailing.kind, RouteKind::Page);
    }

    #[test]
    fn test_percent_encoded_keys() {
        let index = index();

        let page = resolve("/my%20page", &index, "home");
        assert_eq!(page.kind, RouteKind::Page);
        assert_eq!(page.matched_key.as_deref(), Some("my page"));

        let post = resolve("/posts/caf%C3%A9", &index, "home");
        assert_eq!(post.kind, RouteKind::Post);
        assert_eq!(post.matched_key.as_deref(), Some("café"));
    }

    #[test]
    fn test_post_sharing_a_page_key() {
        let index = index();

        let post = resolve("/posts/about", &index, "home");
        assert_eq!(post.kind, RouteKind::Post);
        assert_eq!(post.matched_key.as_deref(), Some("about"));

        let page = resolve("/about", &index, "home");
        assert_eq!(page.kind, RouteKind::Page);
        assert_eq!(page.matched_key.as_deref(), Some("about"));
    }

    #[test]
    fn test_listing() {
        let decision = resolve("/posts", &index(), "home");
        assert_eq!(decision.kind, RouteKind::Listing);
        assert!(decision.matched_key.is_none());
    }

    #[test]
    fn test_page_keys_include_extension() {
        // "home.html" is not the page key "home", and no post is named "home"
        let decision = resolve("/home.html", &index(), "home");
        assert_eq!(decision.kind, RouteKind::NotFound);
    }

    #[test]
    fn test_not_found_iff_no_key_matches() {
        let index = index();
        for path in ["/missing", "/posts/missing", "/404.html", "/a/b/c"] {
            let decision = resolve(path, &index, "home");
            assert_eq!(decision.kind, RouteKind::NotFound, "{path}");
            assert_eq!(decision.status(), 404);
            assert!(!decision.is_found());
        }
        for path in ["/about", "/posts/hello", "/posts", "/"] {
            assert_eq!(resolve(path, &index, "home").status(), 200, "{path}");
        }
    }
}
