// src/services/snapshot.rs

//! Snapshot crawler.
//!
//! Visits every URL through a `PageRenderer` with bounded concurrency and
//! collects one outcome per URL. The crawl is a barrier: the report is only
//! returned once every visit has finished or failed.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::{CrawlFailure, CrawlReport, CrawlResult};
use crate::services::PageRenderer;
use crate::utils::url::output_path_for;

/// One URL to capture and where its snapshot goes.
#[derive(Debug, Clone)]
pub struct SnapshotTarget {
    pub url: String,
    pub output_path: PathBuf,
    /// Accept a 404 answer (the not-found page itself)
    pub allow_not_found: bool,
}

impl SnapshotTarget {
    /// Target whose output path is derived from the URL.
    pub fn from_url(url: impl Into<String>, base: &str) -> Result<Self> {
        let url = url.into();
        let output_path = output_path_for(&url, base)?;
        Ok(Self {
            url,
            output_path,
            allow_not_found: false,
        })
    }

    /// Target with a fixed output path (e.g. `404.html`).
    pub fn fixed(url: impl Into<String>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output_path: output_path.into(),
            allow_not_found: false,
        }
    }

    /// Also accept a 404 answer for this target.
    pub fn allowing_not_found(mut self) -> Self {
        self.allow_not_found = true;
        self
    }

    /// Whether a page served with `status` is a valid snapshot.
    pub fn accepts(&self, status: u16) -> bool {
        (200..300).contains(&status) || (self.allow_not_found && status == 404)
    }
}

/// Service capturing rendered documents.
pub struct SnapshotCrawler {
    renderer: Arc<dyn PageRenderer>,
    concurrency: usize,
}

impl SnapshotCrawler {
    /// Create a crawler; `concurrency` is clamped to at least one visit.
    pub fn new(renderer: Arc<dyn PageRenderer>, concurrency: usize) -> Self {
        Self {
            renderer,
            concurrency: concurrency.max(1),
        }
    }

    /// Capture every target. Results and failures keep the input order.
    pub async fn crawl(&self, targets: Vec<SnapshotTarget>) -> CrawlReport {
        let total = targets.len();
        log::info!(
            "Capturing {} pages ({} concurrent visits)",
            total,
            self.concurrency
        );

        let mut visits = stream::iter(targets)
            .map(|target| {
                let renderer = Arc::clone(&self.renderer);
                async move {
                    let outcome = renderer.render(&target.url).await;
                    (target, outcome)
                }
            })
            .buffered(self.concurrency);

        let mut report = CrawlReport::default();
        while let Some((target, outcome)) = visits.next().await {
            let outcome = outcome.and_then(|page| {
                if target.accepts(page.status) {
                    Ok(page.html)
                } else {
                    Err(AppError::navigation(
                        &target.url,
                        format!("server answered {}", page.status),
                    ))
                }
            });
            match outcome {
                Ok(html) => {
                    log::debug!(
                        "Captured {} -> {}",
                        target.url,
                        target.output_path.display()
                    );
                    report.results.push(CrawlResult {
                        source_url: target.url,
                        output_path: target.output_path,
                        rendered_html: html,
                    });
                }
                Err(error) => {
                    log::warn!("Failed to capture {}: {}", target.url, error);
                    report.failures.push(CrawlFailure {
                        source_url: target.url,
                        error: error.to_string(),
                    });
                }
            }
        }

        log::info!(
            "Captured {}/{} pages ({} failed)",
            report.results.len(),
            total,
            report.failures.len()
        );
        report
    }
}
