// src/services/mod.rs
pub mod analytics;
pub mod banner_settings;
pub mod placement;
pub mod promotions;

pub use analytics::AnalyticsService;
pub use banner_settings::BannerSettingsService;
pub use placement::PlacementResolver;
pub use promotions::PromotionService;
