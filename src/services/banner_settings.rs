// src/services/banner_settings.rs
// Singleton banner-ad configuration. Reads fall back to in-memory
// defaults without persisting them; the row is created lazily on the
// first update.

use crate::models::ads::{BannerSettings, UpdateBannerSettings};
use sqlx::PgPool;

pub struct BannerSettingsService;

impl BannerSettingsService {
    /// The live settings row, or computed defaults if none exists yet.
    pub async fn get(pool: &PgPool) -> Result<BannerSettings, sqlx::Error> {
        let settings = sqlx::query_as::<_, BannerSettings>(
            "SELECT * FROM banner_ad_settings LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        Ok(settings.unwrap_or_default())
    }

    /// Patch the singleton, creating it on first write. Only provided
    /// fields change; an empty patch moves nothing but updated_at.
    pub async fn update(
        pool: &PgPool,
        patch: UpdateBannerSettings,
    ) -> Result<BannerSettings, sqlx::Error> {
        let existing = sqlx::query_as::<_, BannerSettings>(
            "SELECT * FROM banner_ad_settings LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;

        match existing {
            Some(current) => {
                sqlx::query_as::<_, BannerSettings>(
                    r#"
                    UPDATE banner_ad_settings SET
                        enabled = COALESCE($2, enabled),
                        global_enabled = COALESCE($3, global_enabled),
                        home_page_enabled = COALESCE($4, home_page_enabled),
                        video_page_enabled = COALESCE($5, video_page_enabled),
                        subject_page_enabled = COALESCE($6, subject_page_enabled),
                        mobile_enabled = COALESCE($7, mobile_enabled),
                        placement = COALESCE($8, placement),
                        dismissible = COALESCE($9, dismissible),
                        show_close_button = COALESCE($10, show_close_button),
                        minimizable = COALESCE($11, minimizable),
                        auto_hide = COALESCE($12, auto_hide),
                        auto_hide_delay = COALESCE($13, auto_hide_delay),
                        max_impressions = COALESCE($14, max_impressions),
                        ad_network = COALESCE($15, ad_network),
                        updated_at = NOW()
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(current.id)
                .bind(patch.enabled)
                .bind(patch.global_enabled)
                .bind(patch.home_page_enabled)
                .bind(patch.video_page_enabled)
                .bind(patch.subject_page_enabled)
                .bind(patch.mobile_enabled)
                .bind(&patch.placement)
                .bind(patch.dismissible)
                .bind(patch.show_close_button)
                .bind(patch.minimizable)
                .bind(patch.auto_hide)
                .bind(patch.auto_hide_delay)
                .bind(patch.max_impressions)
                .bind(&patch.ad_network)
                .fetch_one(pool)
                .await
            }
            None => {
                let defaults = BannerSettings::default();
                sqlx::query_as::<_, BannerSettings>(
                    r#"
                    INSERT INTO banner_ad_settings (
                        enabled, global_enabled, home_page_enabled,
                        video_page_enabled, subject_page_enabled, mobile_enabled,
                        placement, dismissible, show_close_button, minimizable,
                        auto_hide, auto_hide_delay, max_impressions, ad_network
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                    RETURNING *
                    "#,
                )
                .bind(patch.enabled.unwrap_or(defaults.enabled))
                .bind(patch.global_enabled.unwrap_or(defaults.global_enabled))
                .bind(patch.home_page_enabled.unwrap_or(defaults.home_page_enabled))
                .bind(patch.video_page_enabled.unwrap_or(defaults.video_page_enabled))
                .bind(
                    patch
                        .subject_page_enabled
                        .unwrap_or(defaults.subject_page_enabled),
                )
                .bind(patch.mobile_enabled.unwrap_or(defaults.mobile_enabled))
                .bind(patch.placement.as_deref().unwrap_or(&defaults.placement))
                .bind(patch.dismissible.unwrap_or(defaults.dismissible))
                .bind(patch.show_close_button.unwrap_or(defaults.show_close_button))
                .bind(patch.minimizable.unwrap_or(defaults.minimizable))
                .bind(patch.auto_hide.unwrap_or(defaults.auto_hide))
                .bind(patch.auto_hide_delay.unwrap_or(defaults.auto_hide_delay))
                .bind(patch.max_impressions.unwrap_or(defaults.max_impressions))
                .bind(patch.ad_network.as_deref().unwrap_or(&defaults.ad_network))
                .fetch_one(pool)
                .await
            }
        }
    }
}
