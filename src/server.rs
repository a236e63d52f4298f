//! HTTP surface for proxied subtitles.
//!
//! Only `GET /subfile/<token>.srt` is served here. Every resolution failure
//! collapses into the same generic 500 body; the detail goes to the log.

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde_json::json;
use tracing::{debug, error};

use crate::scheduler::ArchiveResolver;
use crate::token::ProxyToken;

/// Content type served for every proxied subtitle.
pub const SUBRIP_CONTENT_TYPE: &str = "application/x-subrip; charset=utf-8";

/// Client-facing message for any resolution failure.
pub const EXTRACTION_FAILED_MESSAGE: &str = "failed to extract subtitle from archive";

pub fn create_router(resolver: ArchiveResolver) -> Router {
    Router::new()
        .route("/subfile/{file}", get(serve_subfile))
        .fallback(not_found)
        .with_state(resolver)
}

async fn serve_subfile(State(resolver): State<ArchiveResolver>, Path(file): Path<String>) -> Response {
    let Some(token) = ProxyToken::from_file_name(&file) else {
        return not_found().await;
    };

    let outcome = match token {
        Ok(token) => {
            debug!(url = %token.original_url, season = ?token.season, episode = ?token.episode, "Resolving proxied subtitle");
            resolver.resolve_token(&token).await
        }
        Err(err) => Err(err),
    };

    match outcome {
        Ok(body) => ([(header::CONTENT_TYPE, SUBRIP_CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            error!(file = %file, error = %err, "Failed to serve proxied subtitle");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "err": EXTRACTION_FAILED_MESSAGE })),
            )
                .into_response()
        }
    }
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "err": "not found" }))).into_response()
}
