// src/models/content.rs

//! Parsed content file.

use serde::{Deserialize, Serialize};

/// One parsed page or post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentRecord {
    /// File name without extension; unique within its collection
    pub key: String,

    /// `TITLE:` line
    pub title: Option<String>,

    /// `AUTHOR:` line
    pub author: Option<String>,

    /// `DATE:` line, kept verbatim
    pub date: Option<String>,

    /// `URL:` line, emitted as the canonical link
    pub canonical_url: Option<String>,

    /// `NOMENU:1` present
    pub hide_from_menu: bool,

    /// Rendered HTML body
    pub body: String,
}

impl ContentRecord {
    /// Title, or the placeholder shown when the metadata omits it.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("No title")
    }

    /// Author, or placeholder.
    pub fn display_author(&self) -> &str {
        self.author.as_deref().unwrap_or("No author")
    }

    /// Date, or placeholder.
    pub fn display_date(&self) -> &str {
        self.date.as_deref().unwrap_or("No date")
    }
}
