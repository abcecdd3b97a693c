// src/server/templates.rs

//! HTML templates for pages, posts, the post listing and not-found.

use std::cmp::Ordering;

use crate::models::{ContentRecord, RouteDecision, RouteKind};
use crate::server::AppState;

/// Render the full document for a resolved route.
pub fn render(state: &AppState, decision: &RouteDecision) -> String {
    let index = &state.index;
    let site = &state.site;

    let main = match decision.kind {
        RouteKind::Home | RouteKind::Page => {
            let key = decision.matched_key.as_deref().unwrap_or(&site.home_key);
            match index.page(key) {
                Some(record) => article(record),
                None => placeholder_article(),
            }
        }
        RouteKind::Post => match decision.matched_key.as_deref().and_then(|k| index.post(k)) {
            Some(record) => post(record),
            None => placeholder_article(),
        },
        RouteKind::Listing => listing(state),
        RouteKind::NotFound => not_found(state),
    };

    let canonical = match decision.kind {
        RouteKind::Home | RouteKind::Page => decision
            .matched_key
            .as_deref()
            .and_then(|k| index.page(k)),
        RouteKind::Post => decision.matched_key.as_deref().and_then(|k| index.post(k)),
        _ => None,
    }
    .and_then(|record| record.canonical_url.as_deref());

    let mut html = head(state, canonical);
    html.push_str(&header(state));
    html.push_str("<main>\n");
    html.push_str(&main);
    html.push_str("</main>\n");
    html.push_str(&footer(state));
    html.push_str("</body>\n</html>\n");
    html
}

fn head(state: &AppState, canonical: Option<&str>) -> String {
    let canonical = canonical
        .map(|url| format!("  <link rel=\"canonical\" href=\"{}\">\n", escape_html(url)))
        .unwrap_or_default();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n  <meta charset=\"utf-8\">\n  \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n  \
         <title>{name}</title>\n{canonical}  <style>{style}</style>\n</head>\n<body>\n",
        name = escape_html(&state.site.name),
        style = state.style,
    )
}

fn header(state: &AppState) -> String {
    let site = &state.site;
    let mut items: Vec<String> = state
        .index
        .pages
        .values()
        .filter(|page| !page.hide_from_menu)
        .filter(|page| page.key != site.home_key && page.key != site.not_found_key)
        .map(|page| {
            format!(
                "    <li><a href=\"{}\">{}</a></li>",
                state.link(&page.key),
                escape_html(page.title.as_deref().unwrap_or(&page.key))
            )
        })
        .collect();
    items.push(format!(
        "    <li><a href=\"{}\">{}</a></li>",
        state.link(&site.listing_segment),
        escape_html(&site.listing_segment)
    ));

    format!(
        "<header>\n  <div class=\"site-name\"><a href=\"{}\">{}</a></div>\n  <ul class=\"menu\">\n{}\n  </ul>\n</header>\n",
        state.link(""),
        escape_html(&site.name),
        items.join("\n")
    )
}

fn footer(state: &AppState) -> String {
    format!(
        "<footer>\n  <div>{}</div>\n</footer>\n",
        escape_html(&state.site.name)
    )
}

fn article(record: &ContentRecord) -> String {
    format!(
        "<article>\n  <h1>{}</h1>\n{}</article>\n",
        escape_html(record.display_title()),
        record.body
    )
}

fn post(record: &ContentRecord) -> String {
    format!(
        "<article class=\"post\">\n  <h1>{}</h1>\n  <p class=\"byline\">{} · {}</p>\n{}</article>\n",
        escape_html(record.display_title()),
        escape_html(record.display_author()),
        escape_html(record.display_date()),
        record.body
    )
}

fn placeholder_article() -> String {
    "<article>\n  <h1>No title</h1>\n</article>\n".to_string()
}

fn listing(state: &AppState) -> String {
    let listing = &state.site.listing_segment;
    let mut posts: Vec<&ContentRecord> = state.index.posts.values().collect();
    posts.sort_by(|a, b| newest_first(a, b));

    let items: Vec<String> = posts
        .iter()
        .map(|record| {
            format!(
                "    <li><a href=\"{}\">{}</a> <span class=\"date\">{}</span> <span class=\"author\">{}</span></li>",
                state.link(&format!("{listing}/{}", record.key)),
                escape_html(record.display_title()),
                escape_html(record.display_date()),
                escape_html(record.display_author())
            )
        })
        .collect();

    format!(
        "<section class=\"listing\">\n  <ul>\n{}\n  </ul>\n</section>\n",
        items.join("\n")
    )
}

/// Dated posts first, newest date first, ties and undated posts by key.
fn newest_first(a: &ContentRecord, b: &ContentRecord) -> Ordering {
    match (&a.date, &b.date) {
        (Some(da), Some(db)) => db.cmp(da).then_with(|| a.key.cmp(&b.key)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.key.cmp(&b.key),
    }
}

fn not_found(state: &AppState) -> String {
    match state.index.page(&state.site.not_found_key) {
        Some(record) => article(record),
        None => "<article>\n  <h1>Not found</h1>\n</article>\n".to_string(),
    }
}

/// Escape text for HTML element and attribute content.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
