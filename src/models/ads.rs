// src/models/ads.rs
// Brand promotion, placement targeting, analytics, and banner settings models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A brand's paid advertising campaign. Eligible for display only when
/// both `is_active` and `is_approved` are set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BrandPromotion {
    pub id: Uuid,
    pub brand_name: String,
    pub brand_logo: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub product_name: String,
    pub product_description: Option<String>,
    pub target_audience: Option<String>,
    pub campaign_budget: Option<i32>,
    pub campaign_duration_days: i32,
    pub video_url: Option<String>,
    pub website_url: Option<String>,
    pub call_to_action: String,
    pub is_active: bool,
    pub is_approved: bool,
    pub priority: i32,
    pub impressions: i32,
    pub clicks: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBrandPromotion {
    pub brand_name: String,
    pub brand_logo: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub product_name: String,
    pub product_description: Option<String>,
    pub target_audience: Option<String>,
    pub campaign_budget: Option<i32>,
    pub campaign_duration_days: Option<i32>,
    pub video_url: Option<String>,
    pub website_url: Option<String>,
    pub call_to_action: Option<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub priority: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBrandPromotion {
    pub brand_name: Option<String>,
    pub brand_logo: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub product_name: Option<String>,
    pub product_description: Option<String>,
    pub target_audience: Option<String>,
    pub campaign_budget: Option<i32>,
    pub campaign_duration_days: Option<i32>,
    pub video_url: Option<String>,
    pub website_url: Option<String>,
    pub call_to_action: Option<String>,
    pub is_active: Option<bool>,
    pub is_approved: Option<bool>,
    pub priority: Option<i32>,
}

/// Where a promotion may appear. Stored as a plain string column, parsed
/// against the closed set at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementType {
    PreRoll,
    MidRoll,
    PostRoll,
    Banner,
    Overlay,
}

impl PlacementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementType::PreRoll => "pre-roll",
            PlacementType::MidRoll => "mid-roll",
            PlacementType::PostRoll => "post-roll",
            PlacementType::Banner => "banner",
            PlacementType::Overlay => "overlay",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pre-roll" => Some(PlacementType::PreRoll),
            "mid-roll" => Some(PlacementType::MidRoll),
            "post-roll" => Some(PlacementType::PostRoll),
            "banner" => Some(PlacementType::Banner),
            "overlay" => Some(PlacementType::Overlay),
            _ => None,
        }
    }
}

/// A rule describing where and when a promotion may be shown. A rule is
/// meaningless without an active, approved parent promotion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdPlacement {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub placement_type: String,
    pub target_videos: Option<Vec<Uuid>>,
    pub target_subjects: Option<Vec<Uuid>>,
    pub target_batches: Option<Vec<Uuid>>,
    pub show_frequency: i32,
    pub max_daily_shows: i32,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAdPlacement {
    pub placement_type: String,
    pub target_videos: Option<Vec<Uuid>>,
    pub target_subjects: Option<Vec<Uuid>>,
    pub target_batches: Option<Vec<Uuid>>,
    pub show_frequency: Option<i32>,
    pub max_daily_shows: Option<i32>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

/// What a viewer did with a displayed promotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    View,
    Click,
    Skip,
    Complete,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::View => "view",
            ActionType::Click => "click",
            ActionType::Skip => "skip",
            ActionType::Complete => "complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "view" => Some(ActionType::View),
            "click" => Some(ActionType::Click),
            "skip" => Some(ActionType::Skip),
            "complete" => Some(ActionType::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    /// Classify a viewport width in CSS pixels.
    pub fn for_width(width: u32) -> Self {
        if width < 768 {
            DeviceType::Mobile
        } else if width < 1024 {
            DeviceType::Tablet
        } else {
            DeviceType::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
        }
    }
}

/// Append-only record of a single promotion interaction.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub id: Uuid,
    pub promotion_id: Uuid,
    pub user_id: Option<Uuid>,
    pub video_id: Option<Uuid>,
    pub action_type: String,
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackAnalyticsRequest {
    pub promotion_id: Uuid,
    pub video_id: Option<Uuid>,
    pub action_type: String,
    pub device_type: Option<String>,
    /// Fallback for clients that report raw viewport width instead of a
    /// pre-classified device type.
    pub viewport_width: Option<u32>,
    pub user_agent: Option<String>,
}

/// Which ad source fills banner slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdNetwork {
    Mixed,
    BrandOnly,
    AdSense,
    Adsterra,
}

impl AdNetwork {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdNetwork::Mixed => "mixed",
            AdNetwork::BrandOnly => "brand-promotions",
            AdNetwork::AdSense => "adsense",
            AdNetwork::Adsterra => "adsterra",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "mixed" => Some(AdNetwork::Mixed),
            "brand-promotions" => Some(AdNetwork::BrandOnly),
            "adsense" => Some(AdNetwork::AdSense),
            "adsterra" => Some(AdNetwork::Adsterra),
            _ => None,
        }
    }
}

/// Page kinds the banner layer knows about. Anything unrecognized falls
/// back to the global flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Home,
    Video,
    Subject,
    Other,
}

impl PageType {
    pub fn parse(s: &str) -> Self {
        match s {
            "home" => PageType::Home,
            "video" => PageType::Video,
            "subject" => PageType::Subject,
            _ => PageType::Other,
        }
    }
}

/// Singleton banner-ad configuration. `id` is absent when the caller is
/// looking at computed defaults that were never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct BannerSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub enabled: bool,
    pub global_enabled: bool,
    pub home_page_enabled: bool,
    pub video_page_enabled: bool,
    pub subject_page_enabled: bool,
    pub mobile_enabled: bool,
    pub placement: String,
    pub dismissible: bool,
    pub show_close_button: bool,
    pub minimizable: bool,
    pub auto_hide: bool,
    pub auto_hide_delay: i32,
    pub max_impressions: i32,
    pub ad_network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Default for BannerSettings {
    fn default() -> Self {
        BannerSettings {
            id: None,
            enabled: true,
            global_enabled: true,
            home_page_enabled: true,
            video_page_enabled: true,
            subject_page_enabled: true,
            mobile_enabled: true,
            placement: "bottom".to_string(),
            dismissible: true,
            show_close_button: true,
            minimizable: true,
            auto_hide: false,
            auto_hide_delay: 30,
            max_impressions: 1000,
            ad_network: AdNetwork::Mixed.as_str().to_string(),
            created_at: None,
            updated_at: None,
        }
    }
}

impl BannerSettings {
    pub fn should_show_ads(&self) -> bool {
        self.enabled && self.global_enabled
    }

    pub fn should_show_on_page(&self, page: PageType) -> bool {
        self.should_show_ads()
            && match page {
                PageType::Home => self.home_page_enabled,
                PageType::Video => self.video_page_enabled,
                PageType::Subject => self.subject_page_enabled,
                PageType::Other => self.global_enabled,
            }
    }

    pub fn should_show_mobile_ads(&self, page: PageType) -> bool {
        self.should_show_on_page(page) && self.mobile_enabled
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBannerSettings {
    pub enabled: Option<bool>,
    pub global_enabled: Option<bool>,
    pub home_page_enabled: Option<bool>,
    pub video_page_enabled: Option<bool>,
    pub subject_page_enabled: Option<bool>,
    pub mobile_enabled: Option<bool>,
    pub placement: Option<String>,
    pub dismissible: Option<bool>,
    pub show_close_button: Option<bool>,
    pub minimizable: Option<bool>,
    pub auto_hide: Option<bool>,
    pub auto_hide_delay: Option<i32>,
    pub max_impressions: Option<i32>,
    pub ad_network: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_type_thresholds() {
        assert_eq!(DeviceType::for_width(0), DeviceType::Mobile);
        assert_eq!(DeviceType::for_width(767), DeviceType::Mobile);
        assert_eq!(DeviceType::for_width(768), DeviceType::Tablet);
        assert_eq!(DeviceType::for_width(1023), DeviceType::Tablet);
        assert_eq!(DeviceType::for_width(1024), DeviceType::Desktop);
        assert_eq!(DeviceType::for_width(2560), DeviceType::Desktop);
    }

    #[test]
    fn test_action_type_closed_set() {
        assert_eq!(ActionType::parse("view"), Some(ActionType::View));
        assert_eq!(ActionType::parse("click"), Some(ActionType::Click));
        assert_eq!(ActionType::parse("skip"), Some(ActionType::Skip));
        assert_eq!(ActionType::parse("complete"), Some(ActionType::Complete));
        assert_eq!(ActionType::parse("hover"), None);
        assert_eq!(ActionType::parse("VIEW"), None);
    }

    #[test]
    fn test_placement_type_round_trip() {
        for ty in [
            PlacementType::PreRoll,
            PlacementType::MidRoll,
            PlacementType::PostRoll,
            PlacementType::Banner,
            PlacementType::Overlay,
        ] {
            assert_eq!(PlacementType::parse(ty.as_str()), Some(ty));
        }
        assert_eq!(PlacementType::parse("sidebar"), None);
    }

    #[test]
    fn test_banner_defaults() {
        let settings = BannerSettings::default();
        assert!(settings.enabled);
        assert_eq!(settings.placement, "bottom");
        assert_eq!(settings.auto_hide_delay, 30);
        assert_eq!(settings.max_impressions, 1000);
        assert_eq!(settings.ad_network, "mixed");
        assert!(settings.id.is_none());
    }

    #[test]
    fn test_should_show_on_page_requires_all_flags() {
        let mut settings = BannerSettings::default();
        assert!(settings.should_show_on_page(PageType::Video));

        settings.video_page_enabled = false;
        assert!(!settings.should_show_on_page(PageType::Video));
        assert!(settings.should_show_on_page(PageType::Home));

        settings.enabled = false;
        assert!(!settings.should_show_on_page(PageType::Home));

        settings.enabled = true;
        settings.global_enabled = false;
        assert!(!settings.should_show_ads());
        assert!(!settings.should_show_on_page(PageType::Home));
        assert!(!settings.should_show_on_page(PageType::Other));
    }

    #[test]
    fn test_mobile_ads_require_mobile_flag() {
        let mut settings = BannerSettings::default();
        assert!(settings.should_show_mobile_ads(PageType::Home));

        settings.mobile_enabled = false;
        assert!(!settings.should_show_mobile_ads(PageType::Home));
        assert!(settings.should_show_on_page(PageType::Home));
    }

    #[test]
    fn test_ad_network_parse() {
        assert_eq!(AdNetwork::parse("mixed"), Some(AdNetwork::Mixed));
        assert_eq!(AdNetwork::parse("brand-promotions"), Some(AdNetwork::BrandOnly));
        assert_eq!(AdNetwork::parse("adsense"), Some(AdNetwork::AdSense));
        assert_eq!(AdNetwork::parse("adsterra"), Some(AdNetwork::Adsterra));
        assert_eq!(AdNetwork::parse("doubleclick"), None);
    }
}
