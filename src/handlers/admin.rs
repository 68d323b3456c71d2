// src/handlers/admin.rs
// Email whitelist management and operational admin actions.

use crate::handlers::catalog::{bad_request, db_error, not_found};
use crate::middleware::admin::admin_middleware;
use crate::middleware::auth::auth_middleware;
use crate::models::admin::*;
use crate::models::auth::ErrorResponse;
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub fn admin_routes() -> Router {
    Router::new()
        .route("/api/admin/whitelist/status", get(whitelist_status))
        .route("/api/admin/whitelist/toggle", post(toggle_whitelist))
        .route(
            "/api/admin/whitelist/emails",
            get(list_whitelist_emails).post(add_whitelist_email),
        )
        .route("/api/admin/whitelist/emails/:id", delete(remove_whitelist_email))
        .route("/api/admin/cache/clear", post(clear_response_cache))
        .layer(axum::middleware::from_fn(admin_middleware))
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn whitelist_status(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let setting = sqlx::query_as::<_, SystemSetting>(
        "SELECT * FROM system_settings WHERE setting_key = 'whitelist_enabled'",
    )
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching whitelist setting", e))?;

    let enabled = setting
        .map(|s| s.as_bool().unwrap_or(false))
        .unwrap_or(false);

    let total_emails =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM whitelisted_emails")
            .fetch_one(&state.db_pool)
            .await
            .map_err(|e| db_error("counting whitelisted emails", e))?;

    Ok(Json(json!({
        "success": true,
        "status": {
            "enabled": enabled,
            "totalEmails": total_emails
        }
    })))
}

async fn toggle_whitelist(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<WhitelistToggleRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let setting_value = if payload.enabled { "true" } else { "false" };

    sqlx::query(
        "INSERT INTO system_settings (setting_key, setting_value, setting_type, description)
         VALUES ('whitelist_enabled', $1, 'boolean', 'Restrict registration and login to whitelisted emails')
         ON CONFLICT (setting_key)
         DO UPDATE SET setting_value = $1, updated_at = NOW()",
    )
    .bind(setting_value)
    .execute(&state.db_pool)
    .await
    .map_err(|e| db_error("updating whitelist setting", e))?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Whitelist {}", if payload.enabled { "enabled" } else { "disabled" }),
        "enabled": payload.enabled
    })))
}

async fn list_whitelist_emails(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let emails = sqlx::query_as::<_, WhitelistedEmail>(
        "SELECT * FROM whitelisted_emails ORDER BY created_at DESC",
    )
    .fetch_all(&state.db_pool)
    .await
    .map_err(|e| db_error("fetching whitelisted emails", e))?;

    Ok(Json(json!({
        "success": true,
        "emails": emails
    })))
}

async fn add_whitelist_email(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<WhitelistEmailRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    if payload.email.is_empty() || !payload.email.contains('@') {
        return Err(bad_request("Invalid email format"));
    }

    let existing = sqlx::query("SELECT id FROM whitelisted_emails WHERE email = $1")
        .bind(&payload.email)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| db_error("checking whitelist", e))?;

    if existing.is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Email already exists in whitelist")),
        ));
    }

    let email = sqlx::query_as::<_, WhitelistedEmail>(
        "INSERT INTO whitelisted_emails (email) VALUES ($1) RETURNING *",
    )
    .bind(&payload.email)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| db_error("adding whitelisted email", e))?;

    Ok(Json(json!({
        "success": true,
        "email": email
    })))
}

async fn remove_whitelist_email(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let result = sqlx::query("DELETE FROM whitelisted_emails WHERE id = $1")
        .bind(id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| db_error("removing whitelisted email", e))?;

    if result.rows_affected() == 0 {
        return Err(not_found("Whitelisted email not found"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Email removed from whitelist"
    })))
}

/// Drop every cached response. Useful after bulk catalog edits, since
/// cached listings otherwise stay stale until their TTL runs out.
async fn clear_response_cache(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<serde_json::Value> {
    let entries = state.response_cache.len();
    state.response_cache.clear();
    tracing::info!("Response cache cleared ({} entries dropped)", entries);

    Json(json!({
        "success": true,
        "entriesDropped": entries
    }))
}
