// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration (`blip.toml`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Content layout and naming
    #[serde(default)]
    pub site: SiteConfig,

    /// Content server defaults
    #[serde(default)]
    pub server: ServerConfig,

    /// Snapshot behavior
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Freeze output and push target
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let segment = self.site.listing_segment.trim();
        if segment.is_empty() || segment.contains('/') {
            return Err(AppError::validation(
                "site.listing_segment must be a single non-empty path segment",
            ));
        }
        if self.site.home_key.trim().is_empty() {
            return Err(AppError::validation("site.home_key is empty"));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.publish.build_port == 0 {
            return Err(AppError::validation("publish.build_port must be > 0"));
        }
        if self.publish.build_port == self.server.port {
            return Err(AppError::validation(
                "publish.build_port must differ from server.port",
            ));
        }
        if self.publish.startup_timeout_secs == 0 {
            return Err(AppError::validation(
                "publish.startup_timeout_secs must be > 0",
            ));
        }
        if self.publish.output_dir.as_os_str().is_empty() {
            return Err(AppError::validation("publish.output_dir is empty"));
        }
        if self.publish.branch.trim().is_empty() {
            return Err(AppError::validation("publish.branch is empty"));
        }
        Ok(())
    }

    /// Base URL of the build-mode server.
    pub fn build_base_url(&self) -> String {
        format!("http://localhost:{}", self.publish.build_port)
    }
}

/// Content layout and naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Site name shown in the page head and header
    #[serde(default = "defaults::site_name")]
    pub name: String,

    /// Directory of single-segment pages
    #[serde(default = "defaults::pages_dir")]
    pub pages_dir: PathBuf,

    /// Directory of dated posts
    #[serde(default = "defaults::posts_dir")]
    pub posts_dir: PathBuf,

    /// Static asset tree, served at the root and copied into the output
    #[serde(default = "defaults::static_dir")]
    pub static_dir: PathBuf,

    /// Stylesheet inlined into every page head
    #[serde(default = "defaults::style_file")]
    pub style_file: PathBuf,

    /// Reserved segment listing all posts; posts live under it
    #[serde(default = "defaults::listing_segment")]
    pub listing_segment: String,

    /// Page key rendered at `/`
    #[serde(default = "defaults::home_key")]
    pub home_key: String,

    /// Page key whose body is reused for not-found responses
    #[serde(default = "defaults::not_found_key")]
    pub not_found_key: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: defaults::site_name(),
            pages_dir: defaults::pages_dir(),
            posts_dir: defaults::posts_dir(),
            static_dir: defaults::static_dir(),
            style_file: defaults::style_file(),
            listing_segment: defaults::listing_segment(),
            home_key: defaults::home_key(),
            not_found_key: defaults::not_found_key(),
        }
    }
}

/// Content server defaults, overridden by `PORT`/`HOST` in normal mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Default listening port
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Public host used in sitemap locations (default `http://localhost:<port>`)
    #[serde(default)]
    pub host: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: defaults::port(),
            host: None,
        }
    }
}

/// Which renderer captures snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderEngine {
    /// Headless Chrome, captures the document after client-side scripts ran
    Chrome,
    /// Plain HTTP fetch of the server-rendered document
    Http,
}

/// What to do when a single page visit fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Any failed visit fails the whole snapshot phase
    Abort,
    /// Failed visits are logged and left out of the export
    Skip,
}

/// Snapshot behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// Renderer used for each visit
    #[serde(default = "defaults::engine")]
    pub engine: RenderEngine,

    /// Maximum concurrent visits
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay after the load event before capturing, in milliseconds
    #[serde(default = "defaults::settle_ms")]
    pub settle_ms: u64,

    /// Navigation/request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Failure policy for the snapshot barrier
    #[serde(default = "defaults::on_failure")]
    pub on_failure: FailurePolicy,

    /// Run Chrome with its sandbox enabled
    #[serde(default = "defaults::sandbox")]
    pub sandbox: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            engine: defaults::engine(),
            max_concurrent: defaults::max_concurrent(),
            settle_ms: defaults::settle_ms(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            on_failure: defaults::on_failure(),
            sandbox: defaults::sandbox(),
        }
    }
}

/// Freeze output and push target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Output tree, deleted and recreated on every run
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Port of the build-mode server (must not be the default port)
    #[serde(default = "defaults::build_port")]
    pub build_port: u16,

    /// Server binary (default: `blip-server` next to the running executable)
    #[serde(default)]
    pub server_program: Option<PathBuf>,

    /// Arguments placed before `<port> build`
    #[serde(default)]
    pub server_args: Vec<String>,

    /// Upper bound on waiting for the build-mode server
    #[serde(default = "defaults::startup_timeout")]
    pub startup_timeout_secs: u64,

    /// First readiness poll interval, doubled per attempt up to one second
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_ms: u64,

    /// Host written into the published sitemap
    #[serde(default)]
    pub host: Option<String>,

    /// Path prefix of the published site (e.g. `/my-site`)
    #[serde(default)]
    pub subpath: Option<String>,

    /// Branch the output tree is pushed to
    #[serde(default = "defaults::branch")]
    pub branch: String,

    /// Push remote (default: URL of `origin`)
    #[serde(default)]
    pub remote: Option<String>,

    /// Scratch git directory used for the push
    #[serde(default = "defaults::git_dir")]
    pub git_dir: PathBuf,

    /// Commit message for the published tree
    #[serde(default = "defaults::message")]
    pub message: String,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            build_port: defaults::build_port(),
            server_program: None,
            server_args: Vec::new(),
            startup_timeout_secs: defaults::startup_timeout(),
            poll_interval_ms: defaults::poll_interval(),
            host: None,
            subpath: None,
            branch: defaults::branch(),
            remote: None,
            git_dir: defaults::git_dir(),
            message: defaults::message(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::{FailurePolicy, RenderEngine};

    // Site defaults
    pub fn site_name() -> String {
        "My Perfect Site".into()
    }
    pub fn pages_dir() -> PathBuf {
        PathBuf::from("pages")
    }
    pub fn posts_dir() -> PathBuf {
        PathBuf::from("posts")
    }
    pub fn static_dir() -> PathBuf {
        PathBuf::from("static")
    }
    pub fn style_file() -> PathBuf {
        PathBuf::from("style.css")
    }
    pub fn listing_segment() -> String {
        "posts".into()
    }
    pub fn home_key() -> String {
        "home".into()
    }
    pub fn not_found_key() -> String {
        "404".into()
    }

    // Server defaults
    pub fn port() -> u16 {
        3000
    }

    // Crawler defaults
    pub fn engine() -> RenderEngine {
        RenderEngine::Chrome
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn settle_ms() -> u64 {
        100
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; blip/0.1)".into()
    }
    pub fn on_failure() -> FailurePolicy {
        FailurePolicy::Abort
    }
    pub fn sandbox() -> bool {
        true
    }

    // Publish defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("dist")
    }
    pub fn build_port() -> u16 {
        3997
    }
    pub fn startup_timeout() -> u64 {
        10
    }
    pub fn poll_interval() -> u64 {
        50
    }
    pub fn branch() -> String {
        "gh-pages".into()
    }
    pub fn git_dir() -> PathBuf {
        PathBuf::from(".blip-publish")
    }
    pub fn message() -> String {
        "Publish static site".into()
    }
}
