use axum::{Extension, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

mod cache;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

/// Response cache sizing: 10k entries, 15 minute default TTL. Individual
/// routes override the TTL through the cache middleware.
const RESPONSE_CACHE_MAX_ENTRIES: usize = 10_000;
const RESPONSE_CACHE_DEFAULT_TTL: Duration = Duration::from_secs(15 * 60);

// Shared application state: the database pool and the process-local
// response cache. The cache is owned here and injected into handlers so
// tests can build isolated instances.
pub struct AppState {
    pub db_pool: sqlx::PgPool,
    pub response_cache: cache::ResponseCache,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    // Create the database connection pool (runs migrations on startup)
    let db_pool = db::create_pool()
        .await
        .expect("Failed to create database pool.");

    let shared_state = Arc::new(AppState {
        db_pool,
        response_cache: cache::ResponseCache::new(
            RESPONSE_CACHE_MAX_ENTRIES,
            RESPONSE_CACHE_DEFAULT_TTL,
        ),
    });

    // Build our application with all routes and shared state
    let app = Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::catalog::catalog_routes())
        .merge(handlers::videos::video_routes())
        .merge(handlers::promotions::promotion_routes())
        .merge(handlers::admin::admin_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state.clone()));

    // Run the server with ConnectInfo to provide socket addresses for rate limiting
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", bind_addr, e));
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .unwrap();
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,edustream=trace,sqlx=info,hyper=info,tower=info".to_string()
        } else {
            "info,edustream=info,sqlx=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        // Human-readable logging for development
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🎓 EduStream starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) {
            "development"
        } else {
            "production"
        }
    );
    tracing::info!("Log level: {}", log_level);

    Ok(())
}

// API Status endpoint
async fn api_status(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    let db_status = match sqlx::query("SELECT 1").fetch_one(&state.db_pool).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
        },
        "cache": {
            "entries": state.response_cache.len(),
        },
        "features": {
            "brandPromotions": true,
            "bannerAds": true,
            "responseCache": true,
            "accessWhitelist": true,
        }
    }))
}
