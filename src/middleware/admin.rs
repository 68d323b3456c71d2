// src/middleware/admin.rs
use crate::models::auth::{Claims, ErrorResponse};
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

/// Gate for admin-only routes. Runs behind the auth middleware, which
/// puts the verified claims into the request extensions.
pub async fn admin_middleware(
    request: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    match request.extensions().get::<Claims>() {
        Some(claims) if claims.is_staff || claims.is_superuser => Ok(next.run(request).await),
        Some(_) => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "Admin access required. You must be staff or superuser.",
            )),
        )),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Authentication required for admin access.")),
        )),
    }
}
