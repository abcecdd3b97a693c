// src/models/snapshot.rs

//! Snapshot and publish run results.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// Fully rendered document captured for one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlResult {
    pub source_url: String,
    /// Path relative to the output directory
    pub output_path: PathBuf,
    pub rendered_html: String,
}

/// A visit that failed, kept for the report.
#[derive(Debug, Clone)]
pub struct CrawlFailure {
    pub source_url: String,
    pub error: String,
}

/// Per-URL outcome of a crawl, in input order.
#[derive(Debug, Default)]
pub struct CrawlReport {
    pub results: Vec<CrawlResult>,
    pub failures: Vec<CrawlFailure>,
}

impl CrawlReport {
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Phases of a publish run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPhase {
    Idle,
    ServerStarting,
    CrawlingSitemap,
    Snapshotting,
    Exporting,
    Publishing,
    Teardown,
    Done,
    Failed,
}

impl fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublishPhase::Idle => "idle",
            PublishPhase::ServerStarting => "server starting",
            PublishPhase::CrawlingSitemap => "crawling sitemap",
            PublishPhase::Snapshotting => "snapshotting",
            PublishPhase::Exporting => "exporting",
            PublishPhase::Publishing => "publishing",
            PublishPhase::Teardown => "teardown",
            PublishPhase::Done => "done",
            PublishPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Summary of a publish run, returned on success and failure alike.
#[derive(Debug)]
pub struct PublishReport {
    /// `Done` or `Failed`
    pub phase: PublishPhase,
    /// Phase in which a fatal error happened
    pub failed_phase: Option<PublishPhase>,
    /// Fatal error message
    pub error: Option<String>,
    pub pages_written: usize,
    pub crawl_failures: Vec<CrawlFailure>,
    pub sitemap_written: bool,
    pub published: bool,
    /// Push failure, logged without failing the run
    pub publish_error: Option<String>,
    pub server_stopped: bool,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl PublishReport {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            phase: PublishPhase::Idle,
            failed_phase: None,
            error: None,
            pages_written: 0,
            crawl_failures: Vec::new(),
            sitemap_written: false,
            published: false,
            publish_error: None,
            server_stopped: false,
            start_time: now,
            end_time: now,
        }
    }

    pub fn is_success(&self) -> bool {
        self.phase == PublishPhase::Done
    }
}

impl Default for PublishReport {
    fn default() -> Self {
        Self::new()
    }
}
