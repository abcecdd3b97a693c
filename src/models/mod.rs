// src/models/mod.rs

//! Domain models shared by the server and the publish pipeline.

mod config;
mod content;
mod route;
mod snapshot;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, FailurePolicy, PublishConfig, RenderEngine, ServerConfig, SiteConfig,
};
pub use content::ContentRecord;
pub use route::{RouteDecision, RouteKind};
pub use snapshot::{CrawlFailure, CrawlReport, CrawlResult, PublishPhase, PublishReport};
