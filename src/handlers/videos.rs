// src/handlers/videos.rs
// Video endpoints (YouTube-hosted and multi-platform embeds) plus
// per-user watch progress.

use crate::handlers::catalog::{bad_request, db_error, not_found};
use crate::middleware::admin::admin_middleware;
use crate::middleware::auth::auth_middleware;
use crate::middleware::cache::video_metadata_cache;
use crate::models::auth::{Claims, ErrorResponse};
use crate::models::catalog::*;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

pub fn video_routes() -> Router {
    let cached_reads = Router::new()
        .route("/api/subjects/:subject_id/videos", get(list_videos_by_subject))
        .route_layer(axum::middleware::from_fn(video_metadata_cache));

    let reads = Router::new()
        .route("/api/videos/:video_id", get(get_video))
        .route(
            "/api/subjects/:subject_id/multi-platform-videos",
            get(list_multi_platform_by_subject),
        )
        .route(
            "/api/multi-platform-videos/:video_id",
            get(get_multi_platform_video),
        )
        .route("/api/videos/:video_id/progress", get(get_progress).put(put_progress))
        .route("/api/subjects/:subject_id/progress", get(list_progress_by_subject));

    let admin_writes = Router::new()
        .route("/api/subjects/:subject_id/videos", post(create_video))
        .route(
            "/api/videos/:video_id",
            patch(update_video).delete(delete_video),
        )
        .route(
            "/api/subjects/:subject_id/multi-platform-videos",
            post(create_multi_platform_video),
        )
        .route(
            "/api/multi-platform-videos/:video_id",
            patch(update_multi_platform_video).delete(delete_multi_platform_video),
        )
        .layer(axum::middleware::from_fn(admin_middleware));

    cached_reads
        .merge(reads)
        .merge(admin_writes)
        .layer(axum::middleware::from_fn(auth_middleware))
}

// YouTube-hosted videos

async fn list_videos_by_subject(
    Extension(state): Extension<Arc<AppState>>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<Vec<Video>>, (StatusCode, Json<ErrorResponse>)> {
    let videos = sqlx::query_as::<_, Video>(
        "SELECT * FROM videos
         WHERE subject_id = $1 AND is_active = true
         ORDER BY order_index",
    )
    .bind(subject_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching videos", e))?;

    Ok(Json(videos))
}

async fn get_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<Json<Video>, (StatusCode, Json<ErrorResponse>)> {
    let video = sqlx::query_as::<_, Video>("SELECT * FROM videos WHERE id = $1")
        .bind(video_id)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| db_error("fetching video", e))?
        .ok_or_else(|| not_found("Video not found"))?;

    Ok(Json(video))
}

async fn create_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(subject_id): Path<Uuid>,
    Json(payload): Json<NewVideo>,
) -> Result<Json<Video>, (StatusCode, Json<ErrorResponse>)> {
    if payload.title.trim().is_empty() || payload.youtube_video_id.trim().is_empty() {
        return Err(bad_request("Video title and YouTube video id are required"));
    }

    let video = sqlx::query_as::<_, Video>(
        "INSERT INTO videos (
            subject_id, course_id, batch_id, title, description,
            youtube_video_id, duration_seconds, order_index
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(subject_id)
    .bind(payload.course_id)
    .bind(payload.batch_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(payload.youtube_video_id.trim())
    .bind(payload.duration_seconds)
    .bind(payload.order_index.unwrap_or(0))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| db_error("creating video", e))?;

    Ok(Json(video))
}

async fn update_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    Json(payload): Json<UpdateVideo>,
) -> Result<Json<Video>, (StatusCode, Json<ErrorResponse>)> {
    let video = sqlx::query_as::<_, Video>(
        "UPDATE videos SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            youtube_video_id = COALESCE($4, youtube_video_id),
            duration_seconds = COALESCE($5, duration_seconds),
            order_index = COALESCE($6, order_index),
            is_active = COALESCE($7, is_active),
            updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(video_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.youtube_video_id)
    .bind(payload.duration_seconds)
    .bind(payload.order_index)
    .bind(payload.is_active)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("updating video", e))?
    .ok_or_else(|| not_found("Video not found"))?;

    Ok(Json(video))
}

async fn delete_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let result = sqlx::query(
        "UPDATE videos SET is_active = false, updated_at = NOW() WHERE id = $1",
    )
    .bind(video_id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| db_error("deleting video", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found("Video not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Video deleted successfully"
    })))
}

// Multi-platform embeds

async fn list_multi_platform_by_subject(
    Extension(state): Extension<Arc<AppState>>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<Vec<MultiPlatformVideo>>, (StatusCode, Json<ErrorResponse>)> {
    let videos = sqlx::query_as::<_, MultiPlatformVideo>(
        "SELECT * FROM multi_platform_videos
         WHERE subject_id = $1 AND is_active = true
         ORDER BY order_index",
    )
    .bind(subject_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching multi-platform videos", e))?;

    Ok(Json(videos))
}

async fn get_multi_platform_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<Json<MultiPlatformVideo>, (StatusCode, Json<ErrorResponse>)> {
    let video = sqlx::query_as::<_, MultiPlatformVideo>(
        "SELECT * FROM multi_platform_videos WHERE id = $1",
    )
    .bind(video_id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching multi-platform video", e))?
    .ok_or_else(|| not_found("Multi-platform video not found"))?;

    Ok(Json(video))
}

async fn create_multi_platform_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(subject_id): Path<Uuid>,
    Json(payload): Json<NewMultiPlatformVideo>,
) -> Result<Json<MultiPlatformVideo>, (StatusCode, Json<ErrorResponse>)> {
    if payload.title.trim().is_empty()
        || payload.video_url.trim().is_empty()
        || payload.video_id.trim().is_empty()
    {
        return Err(bad_request("Video title, URL, and id are required"));
    }
    if !SUPPORTED_PLATFORMS.contains(&payload.platform.as_str()) {
        return Err(bad_request("Unsupported video platform"));
    }

    let video = sqlx::query_as::<_, MultiPlatformVideo>(
        "INSERT INTO multi_platform_videos (
            subject_id, course_id, batch_id, title, description, platform,
            video_url, video_id, thumbnail, duration_seconds, order_index
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING *",
    )
    .bind(subject_id)
    .bind(payload.course_id)
    .bind(payload.batch_id)
    .bind(payload.title.trim())
    .bind(&payload.description)
    .bind(&payload.platform)
    .bind(payload.video_url.trim())
    .bind(payload.video_id.trim())
    .bind(&payload.thumbnail)
    .bind(payload.duration_seconds)
    .bind(payload.order_index.unwrap_or(0))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| db_error("creating multi-platform video", e))?;

    Ok(Json(video))
}

async fn update_multi_platform_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
    Json(payload): Json<UpdateMultiPlatformVideo>,
) -> Result<Json<MultiPlatformVideo>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(platform) = &payload.platform {
        if !SUPPORTED_PLATFORMS.contains(&platform.as_str()) {
            return Err(bad_request("Unsupported video platform"));
        }
    }

    let video = sqlx::query_as::<_, MultiPlatformVideo>(
        "UPDATE multi_platform_videos SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            platform = COALESCE($4, platform),
            video_url = COALESCE($5, video_url),
            video_id = COALESCE($6, video_id),
            thumbnail = COALESCE($7, thumbnail),
            duration_seconds = COALESCE($8, duration_seconds),
            order_index = COALESCE($9, order_index),
            is_active = COALESCE($10, is_active),
            updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(video_id)
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.platform)
    .bind(&payload.video_url)
    .bind(&payload.video_id)
    .bind(&payload.thumbnail)
    .bind(payload.duration_seconds)
    .bind(payload.order_index)
    .bind(payload.is_active)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("updating multi-platform video", e))?
    .ok_or_else(|| not_found("Multi-platform video not found"))?;

    Ok(Json(video))
}

async fn delete_multi_platform_video(
    Extension(state): Extension<Arc<AppState>>,
    Path(video_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let result = sqlx::query(
        "UPDATE multi_platform_videos SET is_active = false, updated_at = NOW() WHERE id = $1",
    )
    .bind(video_id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| db_error("deleting multi-platform video", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found("Multi-platform video not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Multi-platform video deleted successfully"
    })))
}

// Watch progress

async fn get_progress(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<Uuid>,
) -> Result<Json<Option<UserProgress>>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = claims_user_id(&claims)?;

    let progress = sqlx::query_as::<_, UserProgress>(
        "SELECT * FROM user_progress WHERE user_id = $1 AND video_id = $2",
    )
    .bind(user_id)
    .bind(video_id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching progress", e))?;

    Ok(Json(progress))
}

async fn put_progress(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<Uuid>,
    Json(payload): Json<UpdateUserProgress>,
) -> Result<Json<UserProgress>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = claims_user_id(&claims)?;

    let progress = sqlx::query_as::<_, UserProgress>(
        "INSERT INTO user_progress (user_id, video_id, completed, watch_time_seconds)
         VALUES ($1, $2, COALESCE($3, false), COALESCE($4, 0))
         ON CONFLICT (user_id, video_id) DO UPDATE SET
            completed = COALESCE($3, user_progress.completed),
            watch_time_seconds = COALESCE($4, user_progress.watch_time_seconds),
            last_watched_at = NOW()
         RETURNING *",
    )
    .bind(user_id)
    .bind(video_id)
    .bind(payload.completed)
    .bind(payload.watch_time_seconds)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| db_error("updating progress", e))?;

    Ok(Json(progress))
}

async fn list_progress_by_subject(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<Vec<UserProgress>>, (StatusCode, Json<ErrorResponse>)> {
    let user_id = claims_user_id(&claims)?;

    let progress = sqlx::query_as::<_, UserProgress>(
        "SELECT p.* FROM user_progress p
         INNER JOIN videos v ON v.id = p.video_id
         WHERE p.user_id = $1 AND v.subject_id = $2",
    )
    .bind(user_id)
    .bind(subject_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching subject progress", e))?;

    Ok(Json(progress))
}

fn claims_user_id(claims: &Claims) -> Result<Uuid, (StatusCode, Json<ErrorResponse>)> {
    claims.user_id().ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid token subject")),
        )
    })
}
