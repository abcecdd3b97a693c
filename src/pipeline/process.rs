// src/pipeline/process.rs

//! Build-mode server child process.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::time::{Instant, sleep};

use crate::error::{AppError, Result};
use crate::models::PublishConfig;

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// A running `blip-server <port> build` child.
///
/// The child is killed when this value is dropped; `shutdown` also reaps it.
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
    base_url: String,
}

impl ServerProcess {
    /// Spawn the server and wait until `<base_url>/sitemap.xml` answers.
    ///
    /// `config_path` is forwarded so the child reads the same configuration
    /// file as the caller.
    pub async fn start(
        config: &PublishConfig,
        config_path: Option<&Path>,
        base_url: &str,
        client: &reqwest::Client,
    ) -> Result<Self> {
        let program = server_program(config)?;
        let args = server_arguments(config, config_path);

        log::info!(
            "Starting {} {}",
            program.display(),
            args.iter()
                .map(|arg| arg.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AppError::server_start(format!("failed to spawn {}: {}", program.display(), e))
            })?;

        let mut process = Self {
            child,
            base_url: base_url.trim_end_matches('/').to_string(),
        };

        let timeout = Duration::from_secs(config.startup_timeout_secs);
        let interval = Duration::from_millis(config.poll_interval_ms.max(1));
        if let Err(e) = process.wait_until_ready(client, timeout, interval).await {
            if let Err(stop) = process.shutdown().await {
                log::warn!("Failed to stop server after failed start: {}", stop);
            }
            return Err(e);
        }

        Ok(process)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Poll the sitemap with exponential backoff until it answers 2xx.
    async fn wait_until_ready(
        &mut self,
        client: &reqwest::Client,
        timeout: Duration,
        interval: Duration,
    ) -> Result<()> {
        let sitemap = format!("{}/sitemap.xml", self.base_url);
        let deadline = Instant::now() + timeout;
        let mut delay = interval;
        let mut attempts = 0usize;

        loop {
            if let Some(status) = self.child.try_wait()? {
                return Err(AppError::server_start(format!(
                    "server exited with {status} before becoming ready"
                )));
            }

            attempts += 1;
            match client.get(&sitemap).send().await {
                Ok(response) if response.status().is_success() => {
                    log::info!("Server ready at {} after {} attempts", self.base_url, attempts);
                    return Ok(());
                }
                Ok(response) => log::debug!("Readiness check answered {}", response.status()),
                Err(e) => log::debug!("Readiness check failed: {}", e),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(AppError::server_start(format!(
                    "server not ready at {} within {:?}",
                    self.base_url, timeout
                )));
            }
            sleep(delay.min(deadline - now)).await;
            delay = (delay * 2).min(MAX_POLL_INTERVAL);
        }
    }

    /// Kill the child if it is still running and reap it.
    pub async fn shutdown(mut self) -> Result<()> {
        if self.child.try_wait()?.is_none() {
            self.child.kill().await?;
        }
        log::info!("Stopped server at {}", self.base_url);
        Ok(())
    }
}

/// `[server_args..] <port> build --config <path> [--subpath <subpath>]`
fn server_arguments(config: &PublishConfig, config_path: Option<&Path>) -> Vec<OsString> {
    let mut args: Vec<OsString> = config.server_args.iter().map(OsString::from).collect();
    args.push(config.build_port.to_string().into());
    args.push("build".into());
    if let Some(path) = config_path {
        args.push("--config".into());
        args.push(path.into());
    }
    if let Some(subpath) = &config.subpath {
        args.push("--subpath".into());
        args.push(subpath.into());
    }
    args
}

/// Configured server program, else `blip-server` next to the running binary.
fn server_program(config: &PublishConfig) -> Result<PathBuf> {
    if let Some(program) = &config.server_program {
        return Ok(program.clone());
    }
    let exe = std::env::current_exe()?;
    Ok(exe.with_file_name(format!("blip-server{}", std::env::consts::EXE_SUFFIX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    fn free_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    fn shell(script: &str, port: u16) -> PublishConfig {
        PublishConfig {
            server_program: Some(PathBuf::from("sh")),
            server_args: vec!["-c".into(), script.into(), "blip-server".into()],
            build_port: port,
            startup_timeout_secs: 2,
            poll_interval_ms: 10,
            ..PublishConfig::default()
        }
    }

    #[test]
    fn test_default_program_is_next_to_current_exe() {
        let program = server_program(&PublishConfig::default()).unwrap();
        let exe = std::env::current_exe().unwrap();

        assert_eq!(program.parent(), exe.parent());
        assert!(
            program
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("blip-server")
        );
    }

    #[tokio::test]
    async fn test_child_exit_before_ready_is_server_start_error() {
        let port = free_port();
        let config = shell("exit 3", port);
        let client = reqwest::Client::new();

        let err = ServerProcess::start(&config, None, &format!("http://127.0.0.1:{port}"), &client)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ServerStart(_)));
    }

    #[tokio::test]
    async fn test_missing_program_is_server_start_error() {
        let mut config = shell("true", free_port());
        config.server_program = Some(PathBuf::from("/nonexistent/blip-server"));
        let client = reqwest::Client::new();

        let err = ServerProcess::start(&config, None, "http://127.0.0.1:1", &client)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ServerStart(_)));
    }

    #[tokio::test]
    async fn test_ready_then_shutdown() {
        // Stand-in server answering the readiness check
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = axum::Router::new().route("/sitemap.xml", axum::routing::get(|| async { "<urlset/>" }));
        tokio::spawn(async move { axum::serve(listener, app).await });

        let config = shell("exec sleep 30", port);
        let client = reqwest::Client::new();

        let process = ServerProcess::start(&config, None, &format!("http://127.0.0.1:{port}/"), &client)
            .await
            .unwrap();

        assert_eq!(process.base_url(), format!("http://127.0.0.1:{port}"));
        process.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_never_ready_times_out() {
        let port = free_port();
        let mut config = shell("exec sleep 30", port);
        config.startup_timeout_secs = 1;
        let client = reqwest::Client::new();

        let started = Instant::now();
        let err = ServerProcess::start(&config, None, &format!("http://127.0.0.1:{port}"), &client)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ServerStart(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_server_arguments_carry_config_and_subpath() {
        let mut config = shell("true", 3997);
        config.subpath = Some("/notes".into());

        let args = server_arguments(&config, Some(Path::new("site/blip.toml")));

        let expected: Vec<OsString> = [
            "-c",
            "true",
            "blip-server",
            "3997",
            "build",
            "--config",
            "site/blip.toml",
            "--subpath",
            "/notes",
        ]
        .iter()
        .map(OsString::from)
        .collect();
        assert_eq!(args, expected);

        config.subpath = None;
        let args = server_arguments(&config, None);
        assert_eq!(args.last().unwrap(), "build");
    }

    #[tokio::test]
    async fn test_child_receives_config_and_subpath() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let app = axum::Router::new().route("/sitemap.xml", axum::routing::get(|| async { "<urlset/>" }));
        tokio::spawn(async move { axum::serve(listener, app).await });

        let tmp = tempfile::TempDir::new().unwrap();
        let record = tmp.path().join("argv");
        let script = format!("echo \"$@\" > '{}'; exec sleep 30", record.display());
        let mut config = shell(&script, port);
        config.subpath = Some("/notes".into());
        let client = reqwest::Client::new();

        let process = ServerProcess::start(
            &config,
            Some(Path::new("custom.toml")),
            &format!("http://127.0.0.1:{port}"),
            &client,
        )
        .await
        .unwrap();

        // The readiness loop may win the race against the shell's write
        let deadline = Instant::now() + Duration::from_secs(2);
        let argv = loop {
            match std::fs::read_to_string(&record) {
                Ok(text) if text.ends_with('\n') => break text,
                _ if Instant::now() < deadline => sleep(Duration::from_millis(10)).await,
                other => panic!("argv not recorded: {other:?}"),
            }
        };
        process.shutdown().await.unwrap();

        assert_eq!(
            argv.trim(),
            format!("{port} build --config custom.toml --subpath /notes")
        );
    }
}
