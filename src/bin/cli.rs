// src/bin/cli.rs

//! blip CLI
//!
//! Freezes the site served by `blip-server` into a static tree and publishes it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use blip::{
    error::{AppError, Result},
    models::{Config, FailurePolicy, PublishPhase, RenderEngine},
    pipeline::{PublishPipeline, run_validate},
    services::{ContentIndex, sitemap},
    storage::{DryRunPublisher, GitPublisher, SitePublisher},
};
use clap::{Parser, Subcommand, ValueEnum};

/// blip - markdown site server and static publisher
#[derive(Parser, Debug)]
#[command(
    name = "blip",
    version,
    about = "Freeze a markdown site into static files and publish it"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "blip.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Freeze the site and push it to the publish branch
    Publish(FreezeArgs),

    /// Freeze the site into the output directory without publishing
    Freeze(FreezeArgs),

    /// Print the sitemap built from local content
    Sitemap {
        /// Host written in front of every location
        #[arg(long)]
        host: Option<String>,

        /// Path prefix of the published site
        #[arg(long)]
        subpath: Option<String>,
    },

    /// Validate configuration and content
    Validate,
}

#[derive(clap::Args, Debug)]
struct FreezeArgs {
    /// Output directory (default: publish.output_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export the pages that rendered even if some failed
    #[arg(long)]
    skip_failed: bool,

    /// Renderer used for snapshots
    #[arg(long, value_enum)]
    engine: Option<Engine>,

    /// Public host for the published sitemap
    #[arg(long)]
    host: Option<String>,

    /// Path prefix of the published site
    #[arg(long)]
    subpath: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Engine {
    Chrome,
    Http,
}

impl FreezeArgs {
    /// Apply command-line overrides on top of the file configuration.
    fn apply(self, config: &mut Config) {
        if let Some(output) = self.output {
            config.publish.output_dir = output;
        }
        if self.skip_failed {
            config.crawler.on_failure = FailurePolicy::Skip;
        }
        if let Some(engine) = self.engine {
            config.crawler.engine = match engine {
                Engine::Chrome => RenderEngine::Chrome,
                Engine::Http => RenderEngine::Http,
            };
        }
        if self.host.is_some() {
            config.publish.host = self.host;
        }
        if self.subpath.is_some() {
            config.publish.subpath = self.subpath;
        }
    }
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    log::debug!("Using configuration from {}", cli.config.display());

    match cli.command {
        Command::Publish(args) => {
            args.apply(&mut config);
            let publisher: Arc<dyn SitePublisher> = Arc::new(GitPublisher::new(&config.publish));
            run_pipeline(config, &cli.config, publisher).await?;
        }

        Command::Freeze(args) => {
            args.apply(&mut config);
            run_pipeline(config, &cli.config, Arc::new(DryRunPublisher)).await?;
        }

        Command::Sitemap { host, subpath } => {
            let site = &config.site;
            let index =
                ContentIndex::load(&site.pages_dir, &site.posts_dir, &site.listing_segment)?;
            let host = host
                .or(config.server.host.clone())
                .unwrap_or_else(|| format!("http://localhost:{}", config.server.port));
            let keys = sitemap::SitemapKeys {
                home_key: &site.home_key,
                not_found_key: &site.not_found_key,
            };
            let options = sitemap::SitemapOptions::new(host, subpath);

            print!("{}", sitemap::build(&index, &keys, &options));
        }

        Command::Validate => {
            run_validate(&config)?;
        }
    }

    Ok(())
}

async fn run_pipeline(
    config: Config,
    config_path: &Path,
    publisher: Arc<dyn SitePublisher>,
) -> Result<()> {
    let report = PublishPipeline::new(config, publisher)
        .with_config_path(config_path)
        .run()
        .await;
    if let Some(message) = &report.publish_error {
        // The tree is on disk; only the push failed
        Err(AppError::RunFailed {
            phase: PublishPhase::Publishing.to_string(),
            message: message.clone(),
        })
    } else if report.is_success() {
        Ok(())
    } else {
        let phase = report
            .failed_phase
            .map(|phase| phase.to_string())
            .unwrap_or_default();
        Err(AppError::RunFailed {
            phase,
            message: report.error.unwrap_or_default(),
        })
    }
}
