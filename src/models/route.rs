// src/models/route.rs

//! Route resolution result.

/// Which kind of content a request path resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Home,
    Page,
    Post,
    Listing,
    NotFound,
}

/// Result of resolving a request path against the content index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDecision {
    pub kind: RouteKind,
    /// Content key used for the lookup, when one matched
    pub matched_key: Option<String>,
}

impl RouteDecision {
    pub fn new(kind: RouteKind, matched_key: Option<String>) -> Self {
        Self { kind, matched_key }
    }

    pub fn not_found() -> Self {
        Self::new(RouteKind::NotFound, None)
    }

    /// HTTP status code the renderer must answer with.
    pub fn status(&self) -> u16 {
        match self.kind {
            RouteKind::NotFound => 404,
            _ => 200,
        }
    }

    pub fn is_found(&self) -> bool {
        self.kind != RouteKind::NotFound
    }
}
