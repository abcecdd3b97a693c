// src/storage/git.rs

//! Push the output tree to a git branch (GitHub Pages style).
//!
//! A scratch git directory outside the output tree is used with
//! `--work-tree`, so the published files are never touched.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{AppError, Result};
use crate::models::PublishConfig;
use crate::storage::SitePublisher;
use crate::utils::fs::remove_dir_if_exists;

/// Force-pushes the output tree as a single orphan commit.
#[derive(Debug, Clone)]
pub struct GitPublisher {
    git_dir: PathBuf,
    branch: String,
    remote: Option<String>,
    message: String,
}

impl GitPublisher {
    pub fn new(config: &PublishConfig) -> Self {
        Self {
            git_dir: config.git_dir.clone(),
            branch: config.branch.clone(),
            remote: config.remote.clone(),
            message: config.message.clone(),
        }
    }

    /// Remote to push to; defaults to `origin` of the current repository.
    async fn remote(&self) -> Result<String> {
        if let Some(remote) = &self.remote {
            return Ok(remote.clone());
        }
        let url = run_git(&["remote", "get-url", "origin"]).await?;
        let url = url.trim();
        if url.is_empty() {
            return Err(AppError::publish("no push remote configured and origin has no URL"));
        }
        Ok(url.to_string())
    }

    async fn push_tree(&self, dir: &Path, remote: &str) -> Result<()> {
        let git_dir = self.git_dir.to_string_lossy().into_owned();
        let work_tree = dir.to_string_lossy().into_owned();
        let scoped = |args: &[&str]| -> Vec<String> {
            ["--git-dir", git_dir.as_str(), "--work-tree", work_tree.as_str()]
                .iter()
                .chain(args)
                .map(|s| s.to_string())
                .collect()
        };
        let refspec = format!("HEAD:{}", self.branch);

        run_git_owned(scoped(&["init", "-q"])).await?;
        run_git_owned(scoped(&["checkout", "-q", "--orphan", &self.branch])).await?;
        run_git_owned(scoped(&["add", "-A"])).await?;
        run_git_owned(scoped(&["commit", "-q", "-m", &self.message])).await?;
        run_git_owned(scoped(&["push", "-q", "--force", remote, &refspec])).await?;
        Ok(())
    }
}

#[async_trait]
impl SitePublisher for GitPublisher {
    async fn publish(&self, dir: &Path) -> Result<()> {
        let remote = self.remote().await?;
        log::info!(
            "Pushing {} to {} (branch {})",
            dir.display(),
            remote,
            self.branch
        );

        remove_dir_if_exists(&self.git_dir).await?;
        let outcome = self.push_tree(dir, &remote).await;
        if let Err(e) = remove_dir_if_exists(&self.git_dir).await {
            log::warn!(
                "Failed to remove scratch git dir {}: {}",
                self.git_dir.display(),
                e
            );
        }
        outcome
    }
}

async fn run_git(args: &[&str]) -> Result<String> {
    run_git_owned(args.iter().map(|s| s.to_string()).collect()).await
}

async fn run_git_owned(args: Vec<String>) -> Result<String> {
    log::debug!("git {}", args.join(" "));
    let output = Command::new("git")
        .args(&args)
        .output()
        .await
        .map_err(|e| AppError::publish(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AppError::publish(format!(
            "git {} failed ({}): {}",
            args.first().map(String::as_str).unwrap_or(""),
            output.status,
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_configured_remote_wins() {
        let config = PublishConfig {
            remote: Some("git@example.com:ann/site.git".to_string()),
            ..PublishConfig::default()
        };
        let publisher = GitPublisher::new(&config);

        assert_eq!(
            publisher.remote().await.unwrap(),
            "git@example.com:ann/site.git"
        );
    }

    #[tokio::test]
    async fn test_push_failure_is_publish_error_and_tree_untouched() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("dist");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("index.html"), "home").unwrap();

        let config = PublishConfig {
            remote: Some(tmp.path().join("no-such-remote").display().to_string()),
            git_dir: tmp.path().join("scratch.git"),
            ..PublishConfig::default()
        };
        let publisher = GitPublisher::new(&config);

        let result = publisher.publish(&out).await;

        assert!(matches!(result, Err(AppError::Publish(_))));
        assert_eq!(std::fs::read_to_string(out.join("index.html")).unwrap(), "home");
        assert!(!out.join(".git").exists());
        assert!(!tmp.path().join("scratch.git").exists());
    }
}
