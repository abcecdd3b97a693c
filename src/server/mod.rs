// src/server/mod.rs

//! Content server.
//!
//! Renders pages, posts and the post listing from the in-memory index and
//! serves `/sitemap.xml`. Files under the static directory win over routes.
//! The publish pipeline runs this server in build mode on its own port.

pub mod templates;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::handler::Handler;
use axum::http::{StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::error::{AppError, Result};
use crate::models::{Config, SiteConfig};
use crate::services::router::resolve;
use crate::services::sitemap::{self, SitemapKeys, SitemapOptions, normalize_subpath};
use crate::services::ContentIndex;
use crate::utils::url::encode_segment;

/// Shared, read-only state of a running server.
#[derive(Debug)]
pub struct AppState {
    pub index: ContentIndex,
    pub site: SiteConfig,
    /// Public host used for sitemap locations
    pub host: String,
    /// Prefix for in-page links (`/my-site` when published under a subpath)
    pub link_prefix: String,
    /// Inlined stylesheet
    pub style: String,
}

impl AppState {
    /// Load the content index and stylesheet named in the configuration.
    pub fn load(config: &Config, host: impl Into<String>, link_prefix: &str) -> Result<Self> {
        let site = config.site.clone();
        let index = ContentIndex::load(&site.pages_dir, &site.posts_dir, &site.listing_segment)?;

        let style = match std::fs::read_to_string(&site.style_file) {
            Ok(style) => style,
            Err(e) => {
                log::warn!(
                    "Stylesheet {} not readable ({}), serving unstyled pages",
                    site.style_file.display(),
                    e
                );
                String::new()
            }
        };

        Ok(Self {
            index,
            site,
            host: host.into(),
            link_prefix: normalize_subpath(Some(link_prefix)),
            style,
        })
    }

    /// Site-relative link, `""` being the home page. Each segment of `path`
    /// is percent-encoded.
    pub fn link(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .trim_start_matches('/')
            .split('/')
            .map(encode_segment)
            .collect();
        format!("{}/{}", self.link_prefix, encoded.join("/"))
    }

    fn sitemap_keys(&self) -> SitemapKeys<'_> {
        SitemapKeys {
            home_key: &self.site.home_key,
            not_found_key: &self.site.not_found_key,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SitemapQuery {
    host: Option<String>,
    subpath: Option<String>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let pages = render_route.with_state(Arc::clone(&state));
    let files = ServeDir::new(&state.site.static_dir).fallback(pages);

    Router::new()
        .route("/sitemap.xml", get(sitemap_xml))
        .fallback_service(files)
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::server_start(format!("failed to bind {addr}: {e}")))?;
    serve_listener(state, listener).await
}

/// Serve on an already bound listener.
pub async fn serve_listener(state: AppState, listener: TcpListener) -> Result<()> {
    let local = listener.local_addr()?;
    log::info!("Serving {} on http://{}", state.site.name, local);

    axum::serve(listener, router(Arc::new(state))).await?;
    Ok(())
}

async fn sitemap_xml(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SitemapQuery>,
) -> Response {
    let host = query
        .host
        .filter(|h| !h.trim().is_empty())
        .unwrap_or_else(|| state.host.clone());
    let options = SitemapOptions::new(host, query.subpath);
    let xml = sitemap::build(&state.index, &state.sitemap_keys(), &options);

    ([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response()
}

async fn render_route(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let decision = resolve(uri.path(), &state.index, &state.site.home_key);
    log::debug!("{} -> {:?}", uri.path(), decision.kind);

    let status = StatusCode::from_u16(decision.status()).unwrap_or(StatusCode::OK);
    (status, Html(templates::render(&state, &decision))).into_response()
}
