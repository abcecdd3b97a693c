// src/error.rs

//! Unified error handling for the site server and the publish pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for blip operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A content directory could not be read
    #[error("Failed to load content from {}: {source}", path.display())]
    ContentLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A content key shadows the reserved listing segment
    #[error("{collection} key '{key}' collides with the listing segment")]
    ReservedKey { key: String, collection: String },

    /// Sitemap document is not a valid urlset
    #[error("Sitemap parse error: {0}")]
    SitemapParse(String),

    /// A single page visit failed
    #[error("Navigation failed for {url}: {message}")]
    Navigation { url: String, message: String },

    /// Output tree could not be deleted, copied or written
    #[error("Export failed at {}: {source}", path.display())]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// sitemap.xml could not be written into the output tree
    #[error("Failed to write sitemap to {}: {source}", path.display())]
    SitemapWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Push to the hosting target failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// Build-mode server did not come up
    #[error("Server start error: {0}")]
    ServerStart(String),

    /// A publish run ended in the failed state
    #[error("Publish run failed at {phase}: {message}")]
    RunFailed { phase: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a content load error for a directory.
    pub fn content_load(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ContentLoad {
            path: path.into(),
            source,
        }
    }

    /// Create a navigation error for a single URL.
    pub fn navigation(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Navigation {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an export error for an output path.
    pub fn export(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ExportWrite {
            path: path.into(),
            source,
        }
    }

    /// Create a sitemap parse error.
    pub fn sitemap_parse(message: impl fmt::Display) -> Self {
        Self::SitemapParse(message.to_string())
    }

    /// Create a publish error.
    pub fn publish(message: impl fmt::Display) -> Self {
        Self::Publish(message.to_string())
    }

    /// Create a server start error.
    pub fn server_start(message: impl fmt::Display) -> Self {
        Self::ServerStart(message.to_string())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
