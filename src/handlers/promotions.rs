// src/handlers/promotions.rs
// Brand promotion endpoints: public placement resolution and analytics
// tracking, plus the admin campaign CRUD and banner-ad settings.

use crate::handlers::catalog::{bad_request, db_error, not_found};
use crate::middleware::admin::admin_middleware;
use crate::middleware::auth::auth_middleware;
use crate::models::ads::*;
use crate::models::auth::{Claims, ErrorResponse};
use crate::services::analytics::NewAnalyticsEvent;
use crate::services::placement::{select_single, PlacementContext};
use crate::services::promotions::PromotionError;
use crate::services::{
    AnalyticsService, BannerSettingsService, PlacementResolver, PromotionService,
};
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub fn promotion_routes() -> Router {
    let public = Router::new()
        .route("/api/brand-promotions/active", get(active_promotions))
        .route("/api/brand-promotions/analytics", post(track_analytics))
        .route("/api/banner-ads/visibility", get(banner_visibility));

    let admin = Router::new()
        .route(
            "/api/admin/brand-promotions",
            get(list_promotions).post(create_promotion),
        )
        .route(
            "/api/admin/brand-promotions/:id",
            get(get_promotion)
                .patch(update_promotion)
                .delete(delete_promotion),
        )
        .route(
            "/api/admin/brand-promotions/:id/analytics",
            get(promotion_analytics),
        )
        .route(
            "/api/admin/brand-promotions/:id/stats",
            post(update_promotion_stats),
        )
        .route(
            "/api/admin/brand-promotions/:id/placements",
            get(list_placements).post(create_placement),
        )
        .route(
            "/api/admin/banner-ads",
            get(banner_settings).put(update_banner_settings),
        )
        .layer(axum::middleware::from_fn(admin_middleware));

    public
        .merge(admin)
        .layer(axum::middleware::from_fn(auth_middleware))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActivePromotionsQuery {
    placement_type: String,
    video_id: Option<Uuid>,
    subject_id: Option<Uuid>,
    batch_id: Option<Uuid>,
    /// When set, return at most one promotion picked by the single-slot
    /// selection policy.
    single: Option<bool>,
}

/// Active promotions eligible for a placement slot, ordered by priority.
async fn active_promotions(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<ActivePromotionsQuery>,
) -> Result<Json<Vec<BrandPromotion>>, (StatusCode, Json<ErrorResponse>)> {
    let placement_type = PlacementType::parse(&query.placement_type)
        .ok_or_else(|| bad_request("Unknown placement type"))?;

    let context = PlacementContext {
        video_id: query.video_id,
        subject_id: query.subject_id,
        batch_id: query.batch_id,
    };

    let promotions = PlacementResolver::resolve_active(&state.db_pool, placement_type, &context)
        .await
        .map_err(|e| db_error("resolving active promotions", e))?;

    if query.single.unwrap_or(false) {
        let picked = select_single(&promotions).cloned();
        return Ok(Json(picked.into_iter().collect()));
    }

    Ok(Json(promotions))
}

/// Record a view/click/skip/complete event. The aggregate counters on the
/// promotion are bumped as a second, atomic step.
async fn track_analytics(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<TrackAnalyticsRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    // Clients usually classify the device themselves; fall back to the
    // reported viewport width when they don't.
    let device_type = payload.device_type.clone().or_else(|| {
        payload
            .viewport_width
            .map(|w| DeviceType::for_width(w).as_str().to_string())
    });

    let event = NewAnalyticsEvent {
        promotion_id: payload.promotion_id,
        user_id: claims.user_id(),
        video_id: payload.video_id,
        action_type: payload.action_type,
        device_type,
        user_agent: payload.user_agent,
    };

    AnalyticsService::record(&state.db_pool, event)
        .await
        .map_err(|e| match e {
            crate::services::analytics::AnalyticsError::InvalidAction(action) => {
                bad_request(&format!("Unknown action type: {}", action))
            }
            crate::services::analytics::AnalyticsError::Database(e) => {
                db_error("tracking analytics", e)
            }
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Analytics tracked successfully"
    })))
}

// Admin campaign CRUD

async fn list_promotions(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<BrandPromotion>>, (StatusCode, Json<ErrorResponse>)> {
    let promotions = PromotionService::list_all(&state.db_pool)
        .await
        .map_err(|e| db_error("fetching brand promotions", e))?;
    Ok(Json(promotions))
}

async fn get_promotion(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<BrandPromotion>, (StatusCode, Json<ErrorResponse>)> {
    let promotion = PromotionService::get(&state.db_pool, id)
        .await
        .map_err(|e| db_error("fetching brand promotion", e))?
        .ok_or_else(|| not_found("Brand promotion not found"))?;
    Ok(Json(promotion))
}

async fn create_promotion(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<NewBrandPromotion>,
) -> Result<Json<BrandPromotion>, (StatusCode, Json<ErrorResponse>)> {
    validate_promotion_fields(
        Some(&payload.brand_name),
        Some(&payload.contact_email),
        Some(&payload.product_name),
        payload.priority,
    )?;

    let promotion = PromotionService::create(&state.db_pool, payload)
        .await
        .map_err(|e| db_error("creating brand promotion", e))?;
    Ok(Json(promotion))
}

async fn update_promotion(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBrandPromotion>,
) -> Result<Json<BrandPromotion>, (StatusCode, Json<ErrorResponse>)> {
    validate_promotion_fields(
        payload.brand_name.as_deref(),
        payload.contact_email.as_deref(),
        payload.product_name.as_deref(),
        payload.priority,
    )?;

    let promotion = PromotionService::update(&state.db_pool, id, payload)
        .await
        .map_err(promotion_error)?;
    Ok(Json(promotion))
}

async fn delete_promotion(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    PromotionService::delete(&state.db_pool, id)
        .await
        .map_err(promotion_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Brand promotion deleted successfully"
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatsUpdateRequest {
    impressions: i32,
    clicks: i32,
}

/// Overwrite the aggregate counters without touching any other field.
async fn update_promotion_stats(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatsUpdateRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    if payload.impressions < 0 || payload.clicks < 0 {
        return Err(bad_request("Counters must not be negative"));
    }

    PromotionService::update_stats(&state.db_pool, id, payload.impressions, payload.clicks)
        .await
        .map_err(promotion_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Promotion stats updated"
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VisibilityQuery {
    page_type: Option<String>,
    mobile: Option<bool>,
}

/// Banner visibility verdict for the current page, saving clients from
/// re-deriving the flag logic.
async fn banner_visibility(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<VisibilityQuery>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let settings = BannerSettingsService::get(&state.db_pool)
        .await
        .map_err(|e| db_error("fetching banner ad settings", e))?;

    let page = PageType::parse(query.page_type.as_deref().unwrap_or(""));
    let show_ads = if query.mobile.unwrap_or(false) {
        settings.should_show_mobile_ads(page)
    } else {
        settings.should_show_on_page(page)
    };

    Ok(Json(json!({
        "showAds": show_ads,
        "placement": settings.placement,
        "adNetwork": settings.ad_network
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyticsQuery {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

async fn promotion_analytics(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Vec<AnalyticsEvent>>, (StatusCode, Json<ErrorResponse>)> {
    let promotion = PromotionService::get(&state.db_pool, id)
        .await
        .map_err(|e| db_error("fetching brand promotion", e))?;
    if promotion.is_none() {
        return Err(not_found("Brand promotion not found"));
    }

    let events =
        AnalyticsService::list_events(&state.db_pool, id, query.start_date, query.end_date)
            .await
            .map_err(|e| db_error("fetching analytics", e))?;
    Ok(Json(events))
}

// Placement rules

async fn list_placements(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AdPlacement>>, (StatusCode, Json<ErrorResponse>)> {
    let placements = PlacementResolver::list_for_promotion(&state.db_pool, id)
        .await
        .map_err(|e| db_error("fetching ad placements", e))?;
    Ok(Json(placements))
}

async fn create_placement(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<NewAdPlacement>,
) -> Result<Json<AdPlacement>, (StatusCode, Json<ErrorResponse>)> {
    let placement_type = PlacementType::parse(&payload.placement_type)
        .ok_or_else(|| bad_request("Unknown placement type"))?;

    let promotion = PromotionService::get(&state.db_pool, id)
        .await
        .map_err(|e| db_error("fetching brand promotion", e))?;
    if promotion.is_none() {
        return Err(not_found("Brand promotion not found"));
    }

    let placement = PlacementResolver::create_rule(&state.db_pool, id, placement_type, payload)
        .await
        .map_err(|e| db_error("creating ad placement", e))?;
    Ok(Json(placement))
}

// Banner-ad settings

async fn banner_settings(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<BannerSettings>, (StatusCode, Json<ErrorResponse>)> {
    let settings = BannerSettingsService::get(&state.db_pool)
        .await
        .map_err(|e| db_error("fetching banner ad settings", e))?;
    Ok(Json(settings))
}

async fn update_banner_settings(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<UpdateBannerSettings>,
) -> Result<Json<BannerSettings>, (StatusCode, Json<ErrorResponse>)> {
    if let Some(placement) = &payload.placement {
        if !matches!(placement.as_str(), "bottom" | "top" | "floating") {
            return Err(bad_request("Banner placement must be bottom, top, or floating"));
        }
    }
    if let Some(network) = &payload.ad_network {
        if AdNetwork::parse(network).is_none() {
            return Err(bad_request("Unknown ad network"));
        }
    }
    if matches!(payload.auto_hide_delay, Some(delay) if delay < 0) {
        return Err(bad_request("Auto-hide delay must not be negative"));
    }
    if matches!(payload.max_impressions, Some(cap) if cap < 0) {
        return Err(bad_request("Max impressions must not be negative"));
    }

    let settings = BannerSettingsService::update(&state.db_pool, payload)
        .await
        .map_err(|e| db_error("updating banner ad settings", e))?;
    Ok(Json(settings))
}

/// Shared field validation for promotion create/update payloads. `None`
/// means "field not being changed".
fn validate_promotion_fields(
    brand_name: Option<&str>,
    contact_email: Option<&str>,
    product_name: Option<&str>,
    priority: Option<i32>,
) -> Result<(), (StatusCode, Json<ErrorResponse>)> {
    if matches!(brand_name, Some(name) if name.trim().is_empty()) {
        return Err(bad_request("Brand name is required"));
    }
    if matches!(contact_email, Some(email) if email.is_empty() || !email.contains('@')) {
        return Err(bad_request("A valid contact email is required"));
    }
    if matches!(product_name, Some(name) if name.trim().is_empty()) {
        return Err(bad_request("Product name is required"));
    }
    if matches!(priority, Some(p) if !(1..=5).contains(&p)) {
        return Err(bad_request("Priority must be between 1 and 5"));
    }
    Ok(())
}

fn promotion_error(e: PromotionError) -> (StatusCode, Json<ErrorResponse>) {
    match e {
        PromotionError::NotFound => not_found("Brand promotion not found"),
        PromotionError::Database(e) => db_error("persisting brand promotion", e),
    }
}
