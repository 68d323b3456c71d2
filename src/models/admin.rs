// src/models/admin.rs
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WhitelistedEmail {
    pub id: Uuid,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize, Deserialize, FromRow)]
pub struct SystemSetting {
    pub id: Uuid,
    pub setting_key: String,
    pub setting_value: String,
    pub setting_type: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl SystemSetting {
    pub fn as_bool(&self) -> Result<bool, String> {
        match self.setting_type.as_str() {
            "boolean" => match self.setting_value.as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(format!("Invalid boolean value: {}", self.setting_value)),
            },
            _ => Err(format!("Setting {} is not a boolean type", self.setting_key)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WhitelistEmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct WhitelistToggleRequest {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn setting(ty: &str, value: &str) -> SystemSetting {
        SystemSetting {
            id: Uuid::new_v4(),
            setting_key: "whitelist_enabled".to_string(),
            setting_value: value.to_string(),
            setting_type: ty.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_boolean_setting_parsing() {
        assert_eq!(setting("boolean", "true").as_bool(), Ok(true));
        assert_eq!(setting("boolean", "false").as_bool(), Ok(false));
        assert!(setting("boolean", "yes").as_bool().is_err());
        assert!(setting("string", "true").as_bool().is_err());
    }
}
