// src/services/mod.rs

//! Service layer.
//!
//! This module contains the business logic for:
//! - Content loading (`ContentIndex`)
//! - Route resolution (`router::resolve`)
//! - Sitemap generation and parsing (`sitemap`)
//! - Page capture (`PageRenderer`, `SnapshotCrawler`)

pub mod browser;
pub mod content;
pub mod router;
pub mod sitemap;
pub mod snapshot;

#[cfg(feature = "chrome")]
pub use browser::ChromeRenderer;
pub use browser::{HttpRenderer, PageRenderer, RenderedPage, renderer_for};
pub use content::ContentIndex;
pub use snapshot::{SnapshotCrawler, SnapshotTarget};
