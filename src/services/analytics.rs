// src/services/analytics.rs
// Append-only promotion interaction events plus aggregate counter rollup.

use crate::models::ads::{ActionType, AnalyticsEvent};
use crate::services::PromotionService;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("unknown action type: {0}")]
    InvalidAction(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A fully classified event ready for insertion.
#[derive(Debug)]
pub struct NewAnalyticsEvent {
    pub promotion_id: Uuid,
    pub user_id: Option<Uuid>,
    pub video_id: Option<Uuid>,
    pub action_type: String,
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
}

pub struct AnalyticsService;

impl AnalyticsService {
    /// Append the event, then roll the parent promotion's aggregate
    /// counter. Two explicit steps; the counter bump is an atomic
    /// in-database increment, never read-modify-write.
    pub async fn record(pool: &PgPool, event: NewAnalyticsEvent) -> Result<(), AnalyticsError> {
        let action = ActionType::parse(&event.action_type)
            .ok_or_else(|| AnalyticsError::InvalidAction(event.action_type.clone()))?;

        sqlx::query(
            r#"
            INSERT INTO brand_promotion_analytics (
                promotion_id, user_id, video_id, action_type, device_type, user_agent
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.promotion_id)
        .bind(event.user_id)
        .bind(event.video_id)
        .bind(action.as_str())
        .bind(&event.device_type)
        .bind(&event.user_agent)
        .execute(pool)
        .await?;

        match action {
            ActionType::View => {
                PromotionService::increment_impressions(pool, event.promotion_id).await?
            }
            ActionType::Click => {
                PromotionService::increment_clicks(pool, event.promotion_id).await?
            }
            ActionType::Skip | ActionType::Complete => {}
        }

        tracing::debug!(
            promotion_id = %event.promotion_id,
            action = action.as_str(),
            "recorded promotion analytics event"
        );
        Ok(())
    }

    /// Events for one promotion, newest first, with the optional date
    /// bounds applied.
    pub async fn list_events(
        pool: &PgPool,
        promotion_id: Uuid,
        start_date: Option<DateTime<Utc>>,
        end_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<AnalyticsEvent>, sqlx::Error> {
        sqlx::query_as::<_, AnalyticsEvent>(
            r#"
            SELECT * FROM brand_promotion_analytics
            WHERE promotion_id = $1
              AND ($2::timestamptz IS NULL OR timestamp >= $2)
              AND ($3::timestamptz IS NULL OR timestamp <= $3)
            ORDER BY timestamp DESC
            "#,
        )
        .bind(promotion_id)
        .bind(start_date)
        .bind(end_date)
        .fetch_all(pool)
        .await
    }
}
