// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;
use crate::services::ContentIndex;
use crate::utils::log;

/// Counts reported by a successful validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateSummary {
    pub pages: usize,
    pub posts: usize,
}

/// Validate the configuration and load the content index once.
pub fn run_validate(config: &Config) -> Result<ValidateSummary> {
    log::header("Validating site");

    let outcome = config.validate().and_then(|()| {
        ContentIndex::load(
            &config.site.pages_dir,
            &config.site.posts_dir,
            &config.site.listing_segment,
        )
    });

    match outcome {
        Ok(index) => {
            log::success("Configuration is valid");
            log::sub_item(&format!("Engine: {:?}", config.crawler.engine));
            log::sub_item(&format!("Max concurrent: {}", config.crawler.max_concurrent));
            log::sub_item(&format!("Build port: {}", config.publish.build_port));

            let missing_home = index.page(&config.site.home_key).is_none();
            if missing_home {
                log::warn(&format!(
                    "No page named '{}', the home page will be empty",
                    config.site.home_key
                ));
            }
            if !config.site.static_dir.is_dir() {
                log::warn(&format!(
                    "Static directory {} not found",
                    config.site.static_dir.display()
                ));
            }

            log::success("Content loaded");
            log::sub_item(&format!("Pages: {}", index.pages.len()));
            log::sub_item(&format!("Posts: {}", index.posts.len()));

            Ok(ValidateSummary {
                pages: index.pages.len(),
                posts: index.posts.len(),
            })
        }
        Err(e) => {
            log::error(&format!("Validation failed: {e}"));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    fn config(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.site.pages_dir = tmp.path().join("pages");
        config.site.posts_dir = tmp.path().join("posts");
        config.site.static_dir = tmp.path().join("static");
        config
    }

    #[test]
    fn test_validate_counts_content() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("pages")).unwrap();
        std::fs::create_dir_all(tmp.path().join("posts")).unwrap();
        std::fs::write(tmp.path().join("pages/home.txt"), "TITLE:Home\n\nHi").unwrap();
        std::fs::write(tmp.path().join("posts/a.txt"), "TITLE:A\n\nx").unwrap();
        std::fs::write(tmp.path().join("posts/b.txt"), "TITLE:B\n\ny").unwrap();

        let summary = run_validate(&config(&tmp)).unwrap();

        assert_eq!(summary, ValidateSummary { pages: 1, posts: 2 });
    }

    #[test]
    fn test_validate_missing_content_fails() {
        let tmp = TempDir::new().unwrap();

        let err = run_validate(&config(&tmp)).unwrap_err();

        assert!(matches!(err, AppError::ContentLoad { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_config_first() {
        let tmp = TempDir::new().unwrap();
        let mut config = config(&tmp);
        config.crawler.max_concurrent = 0;

        let err = run_validate(&config).unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }
}
