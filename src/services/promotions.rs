// src/services/promotions.rs
// Brand promotion persistence: admin CRUD, the active listing consumed by
// placement resolution, and the aggregate counter updates.

use crate::models::ads::{BrandPromotion, NewBrandPromotion, UpdateBrandPromotion};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum PromotionError {
    #[error("promotion not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct PromotionService;

impl PromotionService {
    /// Unfiltered admin listing, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<BrandPromotion>, sqlx::Error> {
        sqlx::query_as::<_, BrandPromotion>(
            "SELECT * FROM brand_promotions ORDER BY created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Display-eligible promotions: active AND approved, ordered by
    /// priority, ties broken by recency.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<BrandPromotion>, sqlx::Error> {
        sqlx::query_as::<_, BrandPromotion>(
            "SELECT * FROM brand_promotions
             WHERE is_active = true AND is_approved = true
             ORDER BY priority DESC, created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<Option<BrandPromotion>, sqlx::Error> {
        sqlx::query_as::<_, BrandPromotion>("SELECT * FROM brand_promotions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// New promotions start inactive and unapproved unless the admin says
    /// otherwise.
    pub async fn create(
        pool: &PgPool,
        promotion: NewBrandPromotion,
    ) -> Result<BrandPromotion, sqlx::Error> {
        sqlx::query_as::<_, BrandPromotion>(
            r#"
            INSERT INTO brand_promotions (
                brand_name, brand_logo, contact_email, contact_phone,
                product_name, product_description, target_audience,
                campaign_budget, campaign_duration_days, video_url,
                website_url, call_to_action, is_active, is_approved, priority
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(&promotion.brand_name)
        .bind(&promotion.brand_logo)
        .bind(&promotion.contact_email)
        .bind(&promotion.contact_phone)
        .bind(&promotion.product_name)
        .bind(&promotion.product_description)
        .bind(&promotion.target_audience)
        .bind(promotion.campaign_budget)
        .bind(promotion.campaign_duration_days.unwrap_or(30))
        .bind(&promotion.video_url)
        .bind(&promotion.website_url)
        .bind(promotion.call_to_action.as_deref().unwrap_or("Learn More"))
        .bind(promotion.is_active.unwrap_or(false))
        .bind(promotion.is_approved.unwrap_or(false))
        .bind(promotion.priority.unwrap_or(1))
        .fetch_one(pool)
        .await
    }

    /// Patch only the provided fields, stamping updated_at.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        patch: UpdateBrandPromotion,
    ) -> Result<BrandPromotion, PromotionError> {
        sqlx::query_as::<_, BrandPromotion>(
            r#"
            UPDATE brand_promotions SET
                brand_name = COALESCE($2, brand_name),
                brand_logo = COALESCE($3, brand_logo),
                contact_email = COALESCE($4, contact_email),
                contact_phone = COALESCE($5, contact_phone),
                product_name = COALESCE($6, product_name),
                product_description = COALESCE($7, product_description),
                target_audience = COALESCE($8, target_audience),
                campaign_budget = COALESCE($9, campaign_budget),
                campaign_duration_days = COALESCE($10, campaign_duration_days),
                video_url = COALESCE($11, video_url),
                website_url = COALESCE($12, website_url),
                call_to_action = COALESCE($13, call_to_action),
                is_active = COALESCE($14, is_active),
                is_approved = COALESCE($15, is_approved),
                priority = COALESCE($16, priority),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&patch.brand_name)
        .bind(&patch.brand_logo)
        .bind(&patch.contact_email)
        .bind(&patch.contact_phone)
        .bind(&patch.product_name)
        .bind(&patch.product_description)
        .bind(&patch.target_audience)
        .bind(patch.campaign_budget)
        .bind(patch.campaign_duration_days)
        .bind(&patch.video_url)
        .bind(&patch.website_url)
        .bind(&patch.call_to_action)
        .bind(patch.is_active)
        .bind(patch.is_approved)
        .bind(patch.priority)
        .fetch_optional(pool)
        .await?
        .ok_or(PromotionError::NotFound)
    }

    /// Hard delete; placements and analytics rows cascade at the database.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), PromotionError> {
        let result = sqlx::query("DELETE FROM brand_promotions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(PromotionError::NotFound);
        }
        Ok(())
    }

    /// Narrow setter for the aggregate counters; touches nothing else.
    pub async fn update_stats(
        pool: &PgPool,
        id: Uuid,
        impressions: i32,
        clicks: i32,
    ) -> Result<(), PromotionError> {
        let result = sqlx::query(
            "UPDATE brand_promotions
             SET impressions = $2, clicks = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .bind(impressions)
        .bind(clicks)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(PromotionError::NotFound);
        }
        Ok(())
    }

    /// Atomic counter bump used by the analytics path. An in-place
    /// increment at the database avoids lost updates when concurrent view
    /// events land for the same promotion.
    pub async fn increment_impressions(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE brand_promotions
             SET impressions = impressions + 1, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn increment_clicks(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE brand_promotions
             SET clicks = clicks + 1, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
