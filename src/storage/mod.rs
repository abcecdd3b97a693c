// src/storage/mod.rs

//! Output storage and publishing.
//!
//! - `StaticExporter` writes the frozen site into the output tree
//! - `SitePublisher` pushes that tree to a static host

pub mod git;
pub mod local;

use std::path::Path;

use async_trait::async_trait;

use crate::error::Result;

// Re-export for convenience
pub use git::GitPublisher;
pub use local::{ExportSummary, StaticExporter};

/// Trait for hosting targets the output tree can be pushed to.
#[async_trait]
pub trait SitePublisher: Send + Sync {
    /// Publish the directory verbatim.
    async fn publish(&self, dir: &Path) -> Result<()>;

    /// True when `publish` leaves the tree where it is.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Publisher that only reports what would be pushed.
#[derive(Debug, Clone, Default)]
pub struct DryRunPublisher;

#[async_trait]
impl SitePublisher for DryRunPublisher {
    async fn publish(&self, dir: &Path) -> Result<()> {
        log::info!("Dry run: leaving {} unpublished", dir.display());
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}
