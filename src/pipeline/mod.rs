// src/pipeline/mod.rs

//! Pipeline entry points.
//!
//! - `PublishPipeline`: build-mode server → sitemap → snapshots → export → push
//! - `run_validate`: check configuration and content without serving

pub mod process;
pub mod publish;
pub mod validate;

pub use process::ServerProcess;
pub use publish::PublishPipeline;
pub use validate::{ValidateSummary, run_validate};
