// src/handlers/catalog.rs
// Content hierarchy endpoints: batches, courses, and subjects. Reads are
// open to any authenticated user; mutations sit behind the admin gate.

use crate::middleware::admin::admin_middleware;
use crate::middleware::auth::auth_middleware;
use crate::middleware::cache::static_content_cache;
use crate::models::auth::ErrorResponse;
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

pub fn catalog_routes() -> Router {
    let cached_reads = Router::new()
        .route("/api/batches", get(list_batches))
        .route_layer(axum::middleware::from_fn(static_content_cache));

    let reads = Router::new()
        .route("/api/batches/:batch_id", get(get_batch))
        .route("/api/batches/:batch_id/courses", get(list_courses_by_batch))
        .route("/api/batches/:batch_id/subjects", get(list_subjects_by_batch))
        .route("/api/courses/:course_id/subjects", get(list_subjects_by_course))
        .route("/api/subjects/:subject_id", get(get_subject));

    let admin_writes = Router::new()
        .route("/api/batches", post(create_batch))
        .route(
            "/api/batches/:batch_id",
            patch(update_batch).delete(delete_batch),
        )
        .route("/api/batches/:batch_id/courses", post(create_course))
        .route(
            "/api/courses/:course_id",
            patch(update_course).delete(delete_course),
        )
        .route("/api/batches/:batch_id/subjects", post(create_subject_in_batch))
        .route("/api/courses/:course_id/subjects", post(create_subject_in_course))
        .route(
            "/api/subjects/:subject_id",
            patch(update_subject).delete(delete_subject),
        )
        .layer(axum::middleware::from_fn(admin_middleware));

    cached_reads
        .merge(reads)
        .merge(admin_writes)
        .layer(axum::middleware::from_fn(auth_middleware))
}

// Batches

async fn list_batches(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Batch>>, (StatusCode, Json<ErrorResponse>)> {
    let batches = sqlx::query_as::<_, Batch>(
        "SELECT * FROM batches WHERE is_active = true ORDER BY created_at DESC",
    )
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching batches", e))?;

    Ok(Json(batches))
}

async fn get_batch(
    Extension(state): Extension<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<Batch>, (StatusCode, Json<ErrorResponse>)> {
    let batch = sqlx::query_as::<_, Batch>("SELECT * FROM batches WHERE id = $1")
        .bind(batch_id)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| db_error("fetching batch", e))?
        .ok_or_else(|| not_found("Batch not found"))?;

    Ok(Json(batch))
}

async fn create_batch(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewBatch>,
) -> Result<Json<Batch>, (StatusCode, Json<ErrorResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(bad_request("Batch name is required"));
    }

    let batch = sqlx::query_as::<_, Batch>(
        "INSERT INTO batches (name, description, thumbnail_url, is_active)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(&payload.thumbnail_url)
    .bind(payload.is_active.unwrap_or(true))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| db_error("creating batch", e))?;

    Ok(Json(batch))
}

async fn update_batch(
    Extension(state): Extension<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
    Json(payload): Json<UpdateBatch>,
) -> Result<Json<Batch>, (StatusCode, Json<ErrorResponse>)> {
    let batch = sqlx::query_as::<_, Batch>(
        "UPDATE batches SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            thumbnail_url = COALESCE($4, thumbnail_url),
            is_active = COALESCE($5, is_active),
            updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(batch_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.thumbnail_url)
    .bind(payload.is_active)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("updating batch", e))?
    .ok_or_else(|| not_found("Batch not found"))?;

    Ok(Json(batch))
}

/// Soft delete: the batch disappears from listings but stays referenceable.
async fn delete_batch(
    Extension(state): Extension<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let result = sqlx::query(
        "UPDATE batches SET is_active = false, updated_at = NOW() WHERE id = $1",
    )
    .bind(batch_id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| db_error("deleting batch", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found("Batch not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Batch deleted successfully"
    })))
}

// Courses

async fn list_courses_by_batch(
    Extension(state): Extension<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<Vec<Course>>, (StatusCode, Json<ErrorResponse>)> {
    let courses = sqlx::query_as::<_, Course>(
        "SELECT * FROM courses WHERE batch_id = $1 ORDER BY order_index",
    )
    .bind(batch_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching courses", e))?;

    Ok(Json(courses))
}

async fn create_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
    Json(payload): Json<NewCourse>,
) -> Result<Json<Course>, (StatusCode, Json<ErrorResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(bad_request("Course name is required"));
    }

    let course = sqlx::query_as::<_, Course>(
        "INSERT INTO courses (batch_id, name, description, thumbnail_url, order_index)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING *",
    )
    .bind(batch_id)
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(&payload.thumbnail_url)
    .bind(payload.order_index.unwrap_or(0))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| db_error("creating course", e))?;

    Ok(Json(course))
}

async fn update_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<UpdateCourse>,
) -> Result<Json<Course>, (StatusCode, Json<ErrorResponse>)> {
    let course = sqlx::query_as::<_, Course>(
        "UPDATE courses SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            thumbnail_url = COALESCE($4, thumbnail_url),
            order_index = COALESCE($5, order_index),
            is_active = COALESCE($6, is_active),
            updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(course_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.thumbnail_url)
    .bind(payload.order_index)
    .bind(payload.is_active)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("updating course", e))?
    .ok_or_else(|| not_found("Course not found"))?;

    Ok(Json(course))
}

async fn delete_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let result = sqlx::query(
        "UPDATE courses SET is_active = false, updated_at = NOW() WHERE id = $1",
    )
    .bind(course_id)
    .execute(&state.db_pool)
    .await
    .map_err(|e| db_error("deleting course", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found("Course not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Course deleted successfully"
    })))
}

// Subjects

const SUBJECT_WITH_COUNT: &str = r#"
    SELECT s.id, s.batch_id, s.course_id, s.name, s.description, s.icon,
           s.color, s.order_index, s.created_at, s.updated_at,
           COALESCE(COUNT(v.id), 0) AS video_count
    FROM subjects s
    LEFT JOIN videos v ON v.subject_id = s.id AND v.is_active = true
"#;

async fn list_subjects_by_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Vec<SubjectWithVideoCount>>, (StatusCode, Json<ErrorResponse>)> {
    let subjects = sqlx::query_as::<_, SubjectWithVideoCount>(&format!(
        "{SUBJECT_WITH_COUNT}
         WHERE s.course_id = $1
         GROUP BY s.id
         ORDER BY s.order_index"
    ))
    .bind(course_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching subjects", e))?;

    Ok(Json(subjects))
}

/// Subjects attached directly to a batch, i.e. without a parent course.
async fn list_subjects_by_batch(
    Extension(state): Extension<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<Vec<SubjectWithVideoCount>>, (StatusCode, Json<ErrorResponse>)> {
    let subjects = sqlx::query_as::<_, SubjectWithVideoCount>(&format!(
        "{SUBJECT_WITH_COUNT}
         WHERE s.batch_id = $1 AND s.course_id IS NULL
         GROUP BY s.id
         ORDER BY s.order_index"
    ))
    .bind(batch_id)
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching subjects", e))?;

    Ok(Json(subjects))
}

async fn get_subject(
    Extension(state): Extension<Arc<AppState>>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<Subject>, (StatusCode, Json<ErrorResponse>)> {
    let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
        .bind(subject_id)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| db_error("fetching subject", e))?
        .ok_or_else(|| not_found("Subject not found"))?;

    Ok(Json(subject))
}

async fn create_subject_in_batch(
    Extension(state): Extension<Arc<AppState>>,
    Path(batch_id): Path<Uuid>,
    Json(payload): Json<NewSubject>,
) -> Result<Json<Subject>, (StatusCode, Json<ErrorResponse>)> {
    insert_subject(&state, batch_id, None, payload).await
}

async fn create_subject_in_course(
    Extension(state): Extension<Arc<AppState>>,
    Path(course_id): Path<Uuid>,
    Json(payload): Json<NewSubject>,
) -> Result<Json<Subject>, (StatusCode, Json<ErrorResponse>)> {
    // The batch is inherited from the parent course.
    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
        .bind(course_id)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| db_error("fetching course", e))?
        .ok_or_else(|| not_found("Course not found"))?;

    insert_subject(&state, course.batch_id, Some(course_id), payload).await
}

async fn insert_subject(
    state: &Arc<AppState>,
    batch_id: Uuid,
    course_id: Option<Uuid>,
    payload: NewSubject,
) -> Result<Json<Subject>, (StatusCode, Json<ErrorResponse>)> {
    if payload.name.trim().is_empty() {
        return Err(bad_request("Subject name is required"));
    }

    let subject = sqlx::query_as::<_, Subject>(
        "INSERT INTO subjects (batch_id, course_id, name, description, icon, color, order_index)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING *",
    )
    .bind(batch_id)
    .bind(course_id)
    .bind(payload.name.trim())
    .bind(&payload.description)
    .bind(payload.icon.as_deref().unwrap_or("fas fa-book"))
    .bind(payload.color.as_deref().unwrap_or("blue"))
    .bind(payload.order_index.unwrap_or(0))
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| db_error("creating subject", e))?;

    Ok(Json(subject))
}

async fn update_subject(
    Extension(state): Extension<Arc<AppState>>,
    Path(subject_id): Path<Uuid>,
    Json(payload): Json<UpdateSubject>,
) -> Result<Json<Subject>, (StatusCode, Json<ErrorResponse>)> {
    let subject = sqlx::query_as::<_, Subject>(
        "UPDATE subjects SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            icon = COALESCE($4, icon),
            color = COALESCE($5, color),
            order_index = COALESCE($6, order_index),
            updated_at = NOW()
         WHERE id = $1
         RETURNING *",
    )
    .bind(subject_id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(&payload.icon)
    .bind(&payload.color)
    .bind(payload.order_index)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("updating subject", e))?
    .ok_or_else(|| not_found("Subject not found"))?;

    Ok(Json(subject))
}

/// Subjects are hard-deleted; videos under them cascade at the database.
async fn delete_subject(
    Extension(state): Extension<Arc<AppState>>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
        .bind(subject_id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| db_error("deleting subject", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found("Subject not found"));
    }

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Subject deleted successfully"
    })))
}

// Error helpers shared by this module's handlers.

pub(crate) fn db_error(context: &str, e: sqlx::Error) -> (StatusCode, Json<ErrorResponse>) {
    tracing::error!("Database error {}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}

pub(crate) fn not_found(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new(message)))
}

pub(crate) fn bad_request(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}
