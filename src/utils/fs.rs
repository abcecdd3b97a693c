// src/utils/fs.rs

//! File system utilities.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{AppError, Result};

/// Remove a directory tree, succeeding when it is already absent.
pub async fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match tokio::fs::remove_dir_all(path).await {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Ensure the parent directory of a file exists.
pub async fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Recursively copy `src` into `dest`, returning the number of files copied.
///
/// Any failure is an export error naming the offending path.
pub async fn copy_tree(src: &Path, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| src.to_path_buf());
            AppError::export(path, io::Error::other(e.to_string()))
        })?;

        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| AppError::export(entry.path(), io::Error::other(e.to_string())))?;
        let target: PathBuf = dest.join(relative);

        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|e| AppError::export(&target, e))?;
        } else {
            ensure_parent(&target)
                .await
                .map_err(|e| AppError::export(&target, e))?;
            tokio::fs::copy(entry.path(), &target)
                .await
                .map_err(|e| AppError::export(&target, e))?;
            copied += 1;
        }
    }

    Ok(copied)
}
