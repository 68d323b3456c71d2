// src/models/catalog.rs
// Content hierarchy: batches contain courses, courses (or batches directly)
// contain subjects, subjects contain videos.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBatch {
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub order_index: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourse {
    pub name: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub order_index: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub course_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subject listing row with the count of active videos, used by the
/// course and batch subject listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SubjectWithVideoCount {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub course_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub icon: String,
    pub color: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub video_count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubject {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub subject_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub batch_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub youtube_video_id: String,
    pub duration_seconds: Option<i32>,
    pub order_index: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVideo {
    pub batch_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub youtube_video_id: String,
    pub duration_seconds: Option<i32>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub youtube_video_id: Option<String>,
    pub duration_seconds: Option<i32>,
    pub order_index: Option<i32>,
    pub is_active: Option<bool>,
}

/// Supported external hosts for non-YouTube embeds.
pub const SUPPORTED_PLATFORMS: &[&str] = &[
    "vimeo",
    "facebook",
    "dailymotion",
    "twitch",
    "peertube",
    "rumble",
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MultiPlatformVideo {
    pub id: Uuid,
    pub subject_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub batch_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub platform: String,
    pub video_url: String,
    pub video_id: String,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<i32>,
    pub order_index: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMultiPlatformVideo {
    pub batch_id: Uuid,
    pub course_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub platform: String,
    pub video_url: String,
    pub video_id: String,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<i32>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMultiPlatformVideo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub platform: Option<String>,
    pub video_url: Option<String>,
    pub video_id: Option<String>,
    pub thumbnail: Option<String>,
    pub duration_seconds: Option<i32>,
    pub order_index: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub video_id: Uuid,
    pub completed: bool,
    pub watch_time_seconds: i32,
    pub last_watched_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserProgress {
    pub completed: Option<bool>,
    pub watch_time_seconds: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_platforms_closed_set() {
        assert!(SUPPORTED_PLATFORMS.contains(&"vimeo"));
        assert!(SUPPORTED_PLATFORMS.contains(&"rumble"));
        assert!(!SUPPORTED_PLATFORMS.contains(&"youtube"));
    }
}
