//! HTTP routes.

use crate::{MediaFetcher, attachment_disposition};
use axum::{
    Router,
    body::{Body, Bytes},
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use keepsake_error::DownloadErrorKind;
use keepsake_logger::{LogContext, StructuredLog, trace_api_call};
use serde_json::json;
use std::sync::Arc;
use tracing::{instrument, warn};

/// Shared state for the routes.
#[derive(Clone)]
pub struct AppState {
    logger: Arc<dyn StructuredLog>,
    fetcher: Arc<dyn MediaFetcher>,
}

impl AppState {
    /// Creates new API state.
    pub fn new(logger: Arc<dyn StructuredLog>, fetcher: Arc<dyn MediaFetcher>) -> Self {
        Self { logger, fetcher }
    }
}

/// Query parameters of the download route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadQuery {
    /// Object to fetch
    pub url: Option<String>,
    /// Name offered to the browser
    pub filename: Option<String>,
}

impl DownloadQuery {
    /// Collect parameters from decoded query pairs. The first occurrence of a
    /// key wins; unknown keys are ignored.
    ///
    /// ```
    /// use keepsake_server::DownloadQuery;
    ///
    /// let query = DownloadQuery::from_pairs([
    ///     ("url".to_string(), "https://a.example/1".to_string()),
    ///     ("url".to_string(), "https://b.example/2".to_string()),
    /// ]);
    /// assert_eq!(query.url.as_deref(), Some("https://a.example/1"));
    /// assert_eq!(query.filename, None);
    /// ```
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "url" => &mut query.url,
                "filename" => &mut query.filename,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }
}

/// Creates the proxy router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/download/media", get(download_media))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

/// Fetch an object and return it as an attachment.
#[instrument(skip_all)]
async fn download_media(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Response {
    let query = DownloadQuery::from_pairs(pairs);
    let Some(url) = query.url.filter(|u| !u.is_empty()) else {
        warn!("Download requested without a URL");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": DownloadErrorKind::MissingUrl.to_string()})),
        )
            .into_response();
    };
    let filename = query
        .filename
        .filter(|f| !f.is_empty())
        .unwrap_or_else(|| "download".to_string());

    let context = LogContext::new().with("filename", filename.as_str());
    state.logger.api_request("GET", &url, context.clone());

    let fetched = trace_api_call(
        state.logger.as_ref(),
        "GET",
        &url,
        state.fetcher.fetch(&url),
        context.clone(),
    )
    .await;

    match fetched {
        Ok(body) => attachment(body, &filename),
        Err(e) => {
            let error: &(dyn std::error::Error + 'static) = &e;
            state.logger.error(
                "Download error",
                Some(error),
                context.with("url", url.as_str()),
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Download failed",
                    "message": e.public_message(),
                })),
            )
                .into_response()
        }
    }
}

fn attachment(body: Bytes, filename: &str) -> Response {
    let length = body.len();
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_DISPOSITION, attachment_disposition(filename))
        .header(header::CONTENT_LENGTH, length)
        .header(header::CACHE_CONTROL, "no-store, no-cache, must-revalidate")
        .header(header::PRAGMA, "no-cache")
        .header(header::EXPIRES, "0")
        .body(Body::from(body))
        .unwrap_or_else(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Download failed", "message": e.to_string()})),
            )
                .into_response()
        })
}
