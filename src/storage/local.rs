// src/storage/local.rs

//! Local filesystem export of the frozen site.
//!
//! ## Output Layout
//!
//! ```text
//! {output_dir}/
//! ├── index.html            # Home
//! ├── 404.html              # Not-found snapshot
//! ├── sitemap.xml           # Production-host sitemap
//! ├── {page}/index.html
//! ├── posts/index.html      # Listing
//! ├── posts/{post}/index.html
//! └── ...                   # Verbatim copy of the static tree
//! ```
//!
//! Steps run strictly in order: delete, copy assets, write pages, write
//! sitemap. Only the sitemap write is best effort.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::CrawlResult;
use crate::utils::fs::{copy_tree, ensure_parent, remove_dir_if_exists};
use crate::utils::url::is_contained;

/// What an export produced.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub assets_copied: usize,
    pub pages_written: usize,
    pub sitemap_written: bool,
}

/// Writes crawl results into the output tree.
#[derive(Debug, Clone)]
pub struct StaticExporter {
    output_dir: PathBuf,
    asset_dir: PathBuf,
}

impl StaticExporter {
    /// Create an exporter for the given output and static asset directories.
    pub fn new(output_dir: impl Into<PathBuf>, asset_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            asset_dir: asset_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Replace the output tree with the given results and sitemap.
    pub async fn export(&self, results: &[CrawlResult], sitemap: &str) -> Result<ExportSummary> {
        let mut summary = ExportSummary::default();

        // Validate every target before anything is deleted
        for result in results {
            if !is_contained(&result.output_path) {
                return Err(AppError::export(
                    &result.output_path,
                    std::io::Error::other("output path escapes the output directory"),
                ));
            }
        }

        remove_dir_if_exists(&self.output_dir)
            .await
            .map_err(|e| AppError::export(&self.output_dir, e))?;
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::export(&self.output_dir, e))?;
        log::info!("Cleared output directory {}", self.output_dir.display());

        if self.asset_dir.is_dir() {
            summary.assets_copied = copy_tree(&self.asset_dir, &self.output_dir).await?;
            log::info!(
                "Copied {} static files from {}",
                summary.assets_copied,
                self.asset_dir.display()
            );
        } else {
            log::warn!(
                "Static directory {} not found, skipping asset copy",
                self.asset_dir.display()
            );
        }

        for result in results {
            let path = self.output_dir.join(&result.output_path);
            self.write_bytes(&path, result.rendered_html.as_bytes())
                .await
                .map_err(|e| AppError::export(&path, e))?;
            summary.pages_written += 1;
        }
        log::info!("Wrote {} pages", summary.pages_written);

        summary.sitemap_written = match self.write_sitemap(sitemap).await {
            Ok(()) => true,
            Err(e) => {
                log::error!("{}", e);
                false
            }
        };

        Ok(summary)
    }

    async fn write_sitemap(&self, sitemap: &str) -> Result<()> {
        let path = self.output_dir.join("sitemap.xml");
        self.write_bytes(&path, sitemap.as_bytes())
            .await
            .map_err(|source| AppError::SitemapWrite { path, source })
    }

    /// Create parent directories and write, overwriting any existing file.
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        ensure_parent(path).await?;
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}
