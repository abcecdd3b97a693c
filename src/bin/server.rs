// src/bin/server.rs

//! blip content server
//!
//! `blip-server [PORT] [build] [--subpath PREFIX]`. Build mode is what `blip publish` spawns:
//! it needs an explicit port distinct from the default one and ignores the
//! `PORT`/`HOST` environment.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use blip::{
    error::{AppError, Result},
    models::Config,
    server::{self, AppState},
};
use clap::{Parser, ValueEnum};

/// blip-server - renders the markdown site over HTTP
#[derive(Parser, Debug)]
#[command(name = "blip-server", version, about = "Serve the markdown site")]
struct Cli {
    /// Listening port (default: $PORT, then server.port)
    port: Option<u16>,

    /// Run as the build-mode server used by `blip publish`
    #[arg(value_enum)]
    mode: Option<Mode>,

    /// Path to the configuration file
    #[arg(short, long, default_value = "blip.toml")]
    config: PathBuf,

    /// Link prefix in build mode (default: publish.subpath)
    #[arg(long)]
    subpath: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Build,
}

/// Address, public host and link prefix the server runs with.
#[derive(Debug, PartialEq, Eq)]
struct Listen {
    addr: SocketAddr,
    host: String,
    link_prefix: String,
}

fn listen_settings(
    cli_port: Option<u16>,
    mode: Option<Mode>,
    config: &Config,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Listen> {
    if mode == Some(Mode::Build) {
        let port = cli_port
            .ok_or_else(|| AppError::config("build mode requires an explicit port"))?;
        if port == config.server.port {
            return Err(AppError::config(format!(
                "build mode port {port} must differ from the default port"
            )));
        }
        return Ok(Listen {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, port)),
            host: format!("http://localhost:{port}"),
            link_prefix: config.publish.subpath.clone().unwrap_or_default(),
        });
    }

    let port = match cli_port {
        Some(port) => port,
        None => match env("PORT") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| AppError::config(format!("invalid PORT value '{value}'")))?,
            None => config.server.port,
        },
    };
    let host = env("HOST")
        .or_else(|| config.server.host.clone())
        .unwrap_or_else(|| format!("http://localhost:{port}"));

    Ok(Listen {
        addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
        host,
        link_prefix: String::new(),
    })
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if cli.subpath.is_some() {
        config.publish.subpath = cli.subpath;
    }
    let listen = listen_settings(cli.port, cli.mode, &config, |key| std::env::var(key).ok())?;
    if cli.mode == Some(Mode::Build) {
        log::info!("Build mode on port {}", listen.addr.port());
    }

    let state = AppState::load(&config, listen.host, &listen.link_prefix)?;
    server::serve(state, listen.addr).await
}
