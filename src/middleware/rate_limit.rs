// src/middleware/rate_limit.rs
use axum::{
    extract::{ConnectInfo, Request},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Fixed-window per-IP request counter.
#[derive(Clone)]
pub struct RateLimiter {
    clients: Arc<Mutex<HashMap<String, (u32, Instant)>>>,
    max_requests: u32,
    window_duration: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            clients: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window_duration: Duration::from_secs(window_seconds),
        }
    }

    pub fn check_rate_limit(&self, client_ip: &str) -> bool {
        let mut clients = self.clients.lock().unwrap();
        let now = Instant::now();

        let (count, window_start) = clients
            .entry(client_ip.to_string())
            .or_insert((0, now));

        if now.duration_since(*window_start) > self.window_duration {
            *count = 0;
            *window_start = now;
        }
        if *count >= self.max_requests {
            return false;
        }
        *count += 1;
        true
    }

    /// Drop windows that have already elapsed.
    pub fn cleanup_expired(&self) {
        let mut clients = self.clients.lock().unwrap();
        let now = Instant::now();
        clients.retain(|_, (_, window_start)| {
            now.duration_since(*window_start) <= self.window_duration
        });
    }
}

/// Tight limit for credential endpoints: 10 requests per minute per IP.
pub async fn auth_rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response, impl IntoResponse> {
    static AUTH_RATE_LIMITER: std::sync::OnceLock<RateLimiter> = std::sync::OnceLock::new();
    let rate_limiter = AUTH_RATE_LIMITER.get_or_init(|| RateLimiter::new(10, 60));

    let client_ip = addr.ip().to_string();

    if !rate_limiter.check_rate_limit(&client_ip) {
        tracing::warn!("Rate limit exceeded for IP: {}", client_ip);
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "success": false,
                "message": "Rate limit exceeded. Please try again later.",
                "retry_after": 60
            })),
        ));
    }

    // Occasionally sweep out expired windows.
    if rand::random::<u8>() < 10 {
        rate_limiter.cleanup_expired();
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_enforced_per_ip() {
        let limiter = RateLimiter::new(3, 60);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(limiter.check_rate_limit("10.0.0.1"));
        assert!(!limiter.check_rate_limit("10.0.0.1"));

        // A different client has its own window.
        assert!(limiter.check_rate_limit("10.0.0.2"));
    }

    #[test]
    fn test_window_reset() {
        let limiter = RateLimiter::new(1, 0);
        assert!(limiter.check_rate_limit("10.0.0.1"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(limiter.check_rate_limit("10.0.0.1"));
    }

    #[test]
    fn test_cleanup_drops_elapsed_windows() {
        let limiter = RateLimiter::new(5, 0);
        limiter.check_rate_limit("10.0.0.1");
        std::thread::sleep(Duration::from_millis(5));
        limiter.cleanup_expired();
        assert!(limiter.clients.lock().unwrap().is_empty());
    }
}
