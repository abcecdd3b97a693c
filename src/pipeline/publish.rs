// src/pipeline/publish.rs

//! Publish orchestrator.
//!
//! Starts the build-mode server, reads its sitemap, snapshots every page,
//! exports the output tree and hands it to a `SitePublisher`. A failed push
//! is logged and reported but does not fail the run. The server child is
//! stopped on every path, including early failures.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{Config, FailurePolicy, PublishPhase, PublishReport};
use crate::services::{PageRenderer, SnapshotCrawler, SnapshotTarget, renderer_for, sitemap};
use crate::storage::{SitePublisher, StaticExporter};
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::log;
use crate::utils::url::join;

use super::process::ServerProcess;

const TOTAL_STEPS: usize = 6;

/// Runs one freeze/publish of the site.
pub struct PublishPipeline {
    config: Config,
    publisher: Arc<dyn SitePublisher>,
    renderer: Option<Arc<dyn PageRenderer>>,
    config_path: Option<PathBuf>,
}

impl PublishPipeline {
    pub fn new(config: Config, publisher: Arc<dyn SitePublisher>) -> Self {
        Self {
            config,
            publisher,
            renderer: None,
            config_path: None,
        }
    }

    /// Configuration file the build-mode server is started with.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Use this renderer instead of the one selected by `crawler.engine`.
    pub fn with_renderer(mut self, renderer: Arc<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Run every phase and report the outcome. Never returns early without
    /// stopping the server.
    pub async fn run(&self) -> PublishReport {
        log::header("Publishing site");

        let mut report = PublishReport::new();
        let mut server: Option<ServerProcess> = None;

        let outcome = self.run_phases(&mut report, &mut server).await;
        let failed_phase = report.phase;

        log::step(6, TOTAL_STEPS, "Teardown - Stopping server");
        report.phase = PublishPhase::Teardown;
        report.server_stopped = match server.take() {
            Some(server) => match server.shutdown().await {
                Ok(()) => true,
                Err(e) => {
                    log::warn(&format!("Failed to stop server: {e}"));
                    false
                }
            },
            None => true,
        };

        report.end_time = Utc::now();
        let output = self.config.publish.output_dir.display();
        match outcome {
            Ok(()) => {
                report.phase = PublishPhase::Done;
                if let Some(error) = &report.publish_error {
                    log::warn(&format!("Froze site into {output} but publishing failed: {error}"));
                } else if report.published {
                    log::success(&format!("Published site from {output}"));
                } else {
                    log::success(&format!("Froze site into {output}"));
                }
            }
            Err(e) => {
                report.phase = PublishPhase::Failed;
                report.failed_phase = Some(failed_phase);
                report.error = Some(e.to_string());
                log::error(&format!("Publish failed at {failed_phase}: {e}"));
            }
        }

        log::summary(
            "Publish",
            &[
                ("Pages written", report.pages_written.to_string()),
                ("Failed visits", report.crawl_failures.len().to_string()),
                ("Sitemap written", report.sitemap_written.to_string()),
                ("Published", report.published.to_string()),
                (
                    "Duration",
                    format!(
                        "{}ms",
                        (report.end_time - report.start_time).num_milliseconds()
                    ),
                ),
            ],
        );

        report
    }

    async fn run_phases(
        &self,
        report: &mut PublishReport,
        server: &mut Option<ServerProcess>,
    ) -> Result<()> {
        let config = &self.config;
        config.validate()?;

        let base = config.build_base_url();
        let client = create_async_client(&config.crawler)?;

        log::step(1, TOTAL_STEPS, "Server - Starting build-mode server");
        report.phase = PublishPhase::ServerStarting;
        *server = Some(ServerProcess::start(
            &config.publish,
            self.config_path.as_deref(),
            &base,
            &client,
        ).await?);

        log::step(2, TOTAL_STEPS, "Sitemap - Reading page list");
        report.phase = PublishPhase::CrawlingSitemap;
        let local = fetch_text(&client, &join(&base, "sitemap.xml")).await?;
        let urls = sitemap::parse(&local)?;
        log::sub_item(&format!("{} pages listed", urls.len()));

        let production_url = self.production_sitemap_url(&base)?;
        let production = fetch_text(&client, &production_url).await?;
        sitemap::parse(&production)?;

        log::step(3, TOTAL_STEPS, "Snapshot - Capturing rendered pages");
        report.phase = PublishPhase::Snapshotting;
        let mut targets = urls
            .iter()
            .map(|url| SnapshotTarget::from_url(url.as_str(), &base))
            .collect::<Result<Vec<_>>>()?;
        targets.push(
            SnapshotTarget::fixed(join(&base, "404.html"), "404.html").allowing_not_found(),
        );

        let renderer = match &self.renderer {
            Some(renderer) => Arc::clone(renderer),
            None => renderer_for(&config.crawler).await?,
        };
        let crawl = SnapshotCrawler::new(renderer, config.crawler.max_concurrent)
            .crawl(targets)
            .await;
        report.crawl_failures = crawl.failures.clone();

        if !crawl.is_complete() {
            for failure in &crawl.failures {
                log::warn(&format!("{}: {}", failure.source_url, failure.error));
            }
            if config.crawler.on_failure == FailurePolicy::Abort {
                let first = &crawl.failures[0];
                return Err(AppError::navigation(
                    &first.source_url,
                    format!(
                        "{} of {} visits failed, first: {}",
                        crawl.failures.len(),
                        crawl.total(),
                        first.error
                    ),
                ));
            }
            log::sub_item(&format!(
                "Skipping {} failed pages",
                crawl.failures.len()
            ));
        }

        log::step(4, TOTAL_STEPS, "Export - Writing output tree");
        report.phase = PublishPhase::Exporting;
        let exporter = StaticExporter::new(&config.publish.output_dir, &config.site.static_dir);
        let summary = exporter.export(&crawl.results, &production).await?;
        report.pages_written = summary.pages_written;
        report.sitemap_written = summary.sitemap_written;

        log::step(5, TOTAL_STEPS, "Publish - Pushing output tree");
        report.phase = PublishPhase::Publishing;
        match self.publisher.publish(exporter.output_dir()).await {
            Ok(()) => report.published = !self.publisher.is_dry_run(),
            Err(e) => {
                log::error(&e.to_string());
                report.publish_error = Some(e.to_string());
            }
        }

        Ok(())
    }

    /// Local sitemap rendered with the public host and subpath.
    fn production_sitemap_url(&self, base: &str) -> Result<String> {
        let publish = &self.config.publish;
        let host = publish.host.as_ref().or(self.config.server.host.as_ref());

        let mut params: Vec<(&str, &str)> = Vec::new();
        if let Some(host) = host {
            params.push(("host", host.as_str()));
        }
        if let Some(subpath) = &publish.subpath {
            params.push(("subpath", subpath.as_str()));
        }

        let url = url::Url::parse_with_params(&join(base, "sitemap.xml"), &params)?;
        Ok(url.to_string())
    }
}
