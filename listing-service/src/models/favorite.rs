use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Saved property ids of a user. Kept as a set: adding an id twice is a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteProperties {
    #[serde(rename = "_id")]
    pub user_id: String,
    #[serde(default)]
    pub property_ids: Vec<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}
