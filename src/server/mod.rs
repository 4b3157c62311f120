//! Blog server: pages rendered per request from the content API

use anyhow::Result;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Request, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::cache::PageCache;
use crate::cms::{CmsError, PreviewRef};
use crate::content::{resolve_neighbors, Listing, Post, PostFeed};
use crate::generator::Generator;
use crate::helpers::{encode_component, url_for};
use crate::preview::{self, PreviewError};
use crate::Blog;

/// State shared by every request
pub struct AppState {
    pub blog: Blog,
    pub generator: Generator,
    pub cache: PageCache,
}

impl AppState {
    pub fn new(blog: Blog) -> Result<Self> {
        let generator = Generator::new(&blog)?;
        let cache = PageCache::new(Duration::from_secs(blog.config.revalidate_secs));
        Ok(Self {
            blog,
            generator,
            cache,
        })
    }

    fn feed<'a>(&'a self, preview: Option<&'a PreviewRef>) -> PostFeed<'a> {
        let config = &self.blog.config;
        PostFeed::new(
            self.blog.cms.as_ref(),
            &config.cms.document_type,
            config.listing.page_size,
        )
        .with_preview(preview)
    }

    /// Same-origin URL the browser uses to load listing page `number`.
    ///
    /// Only the page number leaves the server; the CMS search behind it is
    /// rebuilt per request.
    fn api_page_url(&self, number: usize) -> String {
        url_for(&self.blog.config.root, &format!("api/posts?page={}", number))
    }

    fn preview_ref(&self, headers: &HeaderMap) -> Option<PreviewRef> {
        read_cookie(headers, &self.blog.config.preview.cookie_name)
            .and_then(|value| percent_decode_str(&value).decode_utf8().ok().map(|v| v.into_owned()))
            .and_then(PreviewRef::new)
    }

    fn preview_cookie(&self, preview_ref: &PreviewRef) -> String {
        let preview = &self.blog.config.preview;
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            preview.cookie_name,
            encode_component(preview_ref.as_str()),
            preview.session_minutes * 60
        )
    }

    fn expired_preview_cookie(&self) -> String {
        format!(
            "{}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax",
            self.blog.config.preview.cookie_name
        )
    }
}

type SharedState = Arc<AppState>;

/// Build the application router
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/post/:uid", get(post_handler))
        .route("/api/posts", get(posts_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the blog server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(blog.clone())?);
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn home_handler(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    let preview = state.preview_ref(&headers);
    let cache_key = "/";
    if preview.is_none() {
        if let Some(html) = state.cache.get(cache_key) {
            return Html(html).into_response();
        }
    }

    let listing = match Listing::first_page(&state.feed(preview.as_ref())).await {
        Ok(listing) => listing,
        Err(e) => return upstream_error_page(&state, cache_key, &e, preview.is_some()),
    };

    let next_page = listing.has_more().then(|| state.api_page_url(2));
    let view = state.generator.listing_view(&listing.posts, next_page);
    let rendered = state.generator.render_home(&view, preview.is_some());
    cached_page(&state, cache_key, preview.is_none(), rendered)
}

async fn post_handler(
    State(state): State<SharedState>,
    Path(uid): Path<String>,
    headers: HeaderMap,
) -> Response {
    let preview = state.preview_ref(&headers);
    let is_preview = preview.is_some();
    let cache_key = format!("/post/{}", uid);
    if !is_preview {
        if let Some(html) = state.cache.get(&cache_key) {
            return Html(html).into_response();
        }
    }

    let doc_type = &state.blog.config.cms.document_type;
    let cms = state.blog.cms.as_ref();

    let doc = match cms.get_by_uid(doc_type, &uid, preview.as_ref()).await {
        Ok(Some(doc)) => doc,
        Ok(None) => {
            tracing::debug!("Post not found: {}", uid);
            return html_page(
                StatusCode::NOT_FOUND,
                state.generator.render_not_found(is_preview),
            );
        }
        Err(e) => return upstream_error_page(&state, &cache_key, &e, is_preview),
    };

    let post = match Post::from_document(&doc) {
        Ok(post) => post,
        Err(e) => return upstream_error_page(&state, &cache_key, &e, is_preview),
    };

    let neighbors = match resolve_neighbors(cms, doc_type, &post, preview.as_ref()).await {
        Ok(neighbors) => neighbors,
        Err(e) => return upstream_error_page(&state, &cache_key, &e, is_preview),
    };

    let rendered = state.generator.render_post(&post, &neighbors, is_preview);
    cached_page(&state, &cache_key, !is_preview, rendered)
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<String>,
}

/// JSON page for the "load more" button
async fn posts_handler(
    State(state): State<SharedState>,
    Query(params): Query<PageParams>,
    headers: HeaderMap,
) -> Response {
    let preview = state.preview_ref(&headers);
    let number = match params.page.as_deref().map(str::parse::<usize>) {
        None => 1,
        Some(Ok(number)) if number >= 1 => number,
        Some(_) => return invalid_page(),
    };

    match state.feed(preview.as_ref()).load_page(number).await {
        Ok(page) => {
            let next_page = page
                .next_page
                .and(number.checked_add(1))
                .map(|next| state.api_page_url(next));
            Json(state.generator.listing_view(&page.posts, next_page)).into_response()
        }
        Err(e) if e.is_rejection() && !e.is_retryable() => {
            tracing::debug!("Rejected page request: {}", e);
            invalid_page()
        }
        Err(e) => {
            tracing::warn!("Failed to load more posts: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": "Could not load more posts", "retryable": true })),
            )
                .into_response()
        }
    }
}

fn invalid_page() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": "Invalid page", "retryable": false })),
    )
        .into_response()
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

/// Trade a CMS preview token for a preview session
async fn preview_handler(
    State(state): State<SharedState>,
    Query(params): Query<PreviewParams>,
) -> Response {
    let result = preview::exchange(
        state.blog.cms.as_ref(),
        params.token.as_deref(),
        params.document_id.as_deref(),
        &state.blog.config.cms.document_type,
    )
    .await;

    match result {
        Ok(redirect) => {
            let location = url_for(&state.blog.config.root, &redirect.location);
            (
                StatusCode::FOUND,
                [
                    (header::LOCATION, location),
                    (header::SET_COOKIE, state.preview_cookie(&redirect.preview_ref)),
                ],
            )
                .into_response()
        }
        Err(PreviewError::InvalidToken) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid token" })),
        )
            .into_response(),
        Err(PreviewError::Unavailable(e)) => {
            tracing::warn!("Preview exchange failed: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "message": "Content API unavailable", "retryable": true })),
            )
                .into_response()
        }
    }
}

async fn exit_preview_handler(State(state): State<SharedState>) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::LOCATION, url_for(&state.blog.config.root, "/")),
            (header::SET_COOKIE, state.expired_preview_cookie()),
        ],
    )
        .into_response()
}

/// Static files, or the "not found" page
async fn fallback_handler(State(state): State<SharedState>, request: Request<Body>) -> Response {
    let is_preview = state.preview_ref(request.headers()).is_some();

    let mut service = ServeDir::new(&state.blog.static_dir);
    match service.try_call(request).await {
        Ok(response) if response.status() != StatusCode::NOT_FOUND => response.into_response(),
        Ok(_) => html_page(
            StatusCode::NOT_FOUND,
            state.generator.render_not_found(is_preview),
        ),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response(),
    }
}

/// Serve a rendered page, remembering it when it may be reused
fn cached_page(
    state: &AppState,
    key: &str,
    cacheable: bool,
    rendered: Result<String>,
) -> Response {
    match rendered {
        Ok(html) => {
            if cacheable {
                state.cache.insert(key, html.clone());
            }
            Html(html).into_response()
        }
        Err(e) => render_failure(e),
    }
}

fn upstream_error_page(state: &AppState, retry_path: &str, error: &CmsError, preview: bool) -> Response {
    tracing::warn!("Content API request failed: {}", error);
    let retry_url = url_for(&state.blog.config.root, retry_path);
    html_page(
        StatusCode::BAD_GATEWAY,
        state.generator.render_error(&retry_url, preview),
    )
}

fn html_page(status: StatusCode, rendered: Result<String>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => render_failure(e),
    }
}

fn render_failure(error: anyhow::Error) -> Response {
    tracing::error!("Failed to render page: {:#}", error);
    (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response()
}

/// Value of cookie `name` from the request headers
fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}
