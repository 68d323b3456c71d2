// src/handlers/auth.rs
use crate::middleware::rate_limit::auth_rate_limit_middleware;
use crate::models::auth::*;
use crate::AppState;
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post, Router},
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use sqlx::FromRow;
use std::sync::Arc;

pub fn auth_routes() -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify_token))
        .layer(axum::middleware::from_fn(auth_rate_limit_middleware))
}

async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.email.is_empty() || payload.username.is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Email, username, and password are required",
            )),
        ));
    }

    if payload.password.len() < 6 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Password must be at least 6 characters long",
            )),
        ));
    }

    check_whitelist_enabled(&state, &payload.email).await?;

    let existing_user = sqlx::query("SELECT id FROM users WHERE email = $1 OR username = $2")
        .bind(&payload.email)
        .bind(&payload.username)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error checking existing user: {}", e);
            internal_error()
        })?;

    if existing_user.is_some() {
        return Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse::new(
                "User with this email or username already exists",
            )),
        ));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Error hashing password: {}", e);
        internal_error()
    })?;

    // Normal users are neither staff nor superuser by default.
    let row = sqlx::query(
        "INSERT INTO users (email, username, password_hash, is_active, is_superuser, is_staff)
         VALUES ($1, $2, $3, true, false, false)
         RETURNING *",
    )
    .bind(&payload.email)
    .bind(&payload.username)
    .bind(&password_hash)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Error creating user: {}", e);
        internal_error()
    })?;

    let user = User::from_row(&row).map_err(|e| {
        tracing::error!("Error converting row to User: {}", e);
        internal_error()
    })?;

    let token = generate_jwt_token(&user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "User registered successfully".to_string(),
        user: UserResponse::from(user),
        token,
    }))
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.email.is_empty() || payload.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Email and password are required")),
        ));
    }

    check_whitelist_enabled(&state, &payload.email).await?;

    let row = sqlx::query("SELECT * FROM users WHERE email = $1 AND is_active = true")
        .bind(&payload.email)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error finding user: {}", e);
            internal_error()
        })?;

    let user = match row {
        Some(row) => User::from_row(&row).map_err(|e| {
            tracing::error!("Error converting row to User: {}", e);
            internal_error()
        })?,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid email or password")),
            ));
        }
    };

    match verify(&payload.password, &user.password_hash) {
        Ok(true) => {}
        Ok(false) => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid email or password")),
            ));
        }
        Err(e) => {
            tracing::error!("Error verifying password: {}", e);
            return Err(internal_error());
        }
    }

    let token = generate_jwt_token(&user)?;

    Ok(Json(AuthResponse {
        success: true,
        message: "Login successful".to_string(),
        user: UserResponse::from(user),
        token,
    }))
}

async fn verify_token(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let token = crate::middleware::auth::bearer_token(&headers)
        .map_err(|message| (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))))?;

    let claims = verify_jwt_token(token).map_err(|e| {
        tracing::warn!("JWT verification failed: {}", e);
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid or expired token")),
        )
    })?;

    let user_id = claims.user_id().ok_or_else(|| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Invalid token subject")),
        )
    })?;

    let row = sqlx::query("SELECT * FROM users WHERE id = $1 AND is_active = true")
        .bind(user_id)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error finding user: {}", e);
            internal_error()
        })?;

    let user = match row {
        Some(row) => User::from_row(&row).map_err(|e| {
            tracing::error!("Error converting row to User: {}", e);
            internal_error()
        })?,
        None => {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("User not found")),
            ));
        }
    };

    Ok(Json(serde_json::json!({
        "success": true,
        "user": UserResponse::from(user)
    })))
}

fn generate_jwt_token(user: &User) -> Result<String, (StatusCode, Json<ErrorResponse>)> {
    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());

    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp();

    let claims = Claims {
        sub: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        is_superuser: user.is_superuser,
        is_staff: user.is_staff,
        exp: expiration as usize,
        iat: Utc::now().timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .map_err(|e| {
        tracing::error!("Error generating JWT token: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to generate authentication token")),
        )
    })
}

pub fn verify_jwt_token(token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_ref()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Reject non-whitelisted emails when the whitelist toggle is on.
async fn check_whitelist_enabled(
    state: &Arc<AppState>,
    email: &str,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    let setting = sqlx::query_as::<_, crate::models::admin::SystemSetting>(
        "SELECT * FROM system_settings WHERE setting_key = 'whitelist_enabled'",
    )
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| {
        tracing::error!("Database error checking whitelist setting: {}", e);
        internal_error()
    })?;

    let whitelist_enabled = setting
        .map(|s| s.as_bool().unwrap_or(false))
        .unwrap_or(false);

    if !whitelist_enabled {
        return Ok(());
    }

    let whitelisted = sqlx::query("SELECT id FROM whitelisted_emails WHERE email = $1")
        .bind(email)
        .fetch_optional(&state.db_pool)
        .await
        .map_err(|e| {
            tracing::error!("Database error checking whitelist: {}", e);
            internal_error()
        })?;

    if whitelisted.is_none() {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Access restricted. Email not whitelisted.")),
        ));
    }

    Ok(())
}

fn internal_error() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}
