// src/middleware/cache.rs
// Response caching for read-heavy GET endpoints. The cache key is the
// full request URI including the query string, so distinct placement or
// filter queries never share an entry.

use crate::AppState;
use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Duration;

/// Batches and other rarely-changing listings.
const STATIC_CONTENT_TTL: Duration = Duration::from_secs(30 * 60);
/// Video metadata listings.
const VIDEO_METADATA_TTL: Duration = Duration::from_secs(60 * 60);

pub async fn static_content_cache(req: Request, next: Next) -> Response {
    cached_response(req, next, STATIC_CONTENT_TTL).await
}

pub async fn video_metadata_cache(req: Request, next: Next) -> Response {
    cached_response(req, next, VIDEO_METADATA_TTL).await
}

async fn cached_response(req: Request, next: Next, ttl: Duration) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let Some(state) = req.extensions().get::<Arc<AppState>>().cloned() else {
        return next.run(req).await;
    };
    let key = req.uri().to_string();

    if let Some(body) = state.response_cache.get(&key) {
        return hit_response(body);
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to buffer response body for caching: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    state.response_cache.put(&key, bytes.clone(), Some(ttl));
    parts
        .headers
        .insert("x-cache", HeaderValue::from_static("MISS"));
    Response::from_parts(parts, Body::from(bytes))
}

fn hit_response(body: Bytes) -> Response {
    let mut response = Response::new(Body::from(body));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
        .headers_mut()
        .insert("x-cache", HeaderValue::from_static("HIT"));
    response
}
