// src/middleware/auth.rs
use crate::handlers::auth::verify_jwt_token;
use crate::models::auth::ErrorResponse;
use axum::{
    extract::Request,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};

pub async fn auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    let token = match bearer_token(&headers) {
        Ok(token) => token,
        Err(message) => {
            return Err((StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))));
        }
    };

    let claims = match verify_jwt_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::warn!("JWT verification failed: {}", e);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid or expired token")),
            ));
        }
    };

    // Make the claims available to handlers downstream.
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Pull the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
    let header = headers
        .get("Authorization")
        .ok_or("Missing Authorization header")?;
    let value = header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;
    value
        .strip_prefix("Bearer ")
        .ok_or("Invalid Authorization header format. Expected 'Bearer <token>'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert("Authorization", HeaderValue::from_static("Token abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert("Authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Ok("abc.def.ghi"));
    }
}
