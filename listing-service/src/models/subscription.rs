use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A purchasable plan. `limits` is the maximum number of metered property
/// views a subscriber may make; a plan stored without it is misconfigured.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPlan {
    #[serde(rename = "_id")]
    pub subscription_id: String,
    pub plan_type: String,
    #[serde(default)]
    pub limits: Option<i64>,
    pub description: Option<String>,
    pub price: Option<f64>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_on: DateTime<Utc>,
}

impl SubscriptionPlan {
    pub fn new(
        plan_type: String,
        limits: i64,
        description: Option<String>,
        price: Option<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            subscription_id: Uuid::new_v4().to_string(),
            plan_type,
            limits: Some(limits),
            description,
            price,
            created_on: now,
            modified_on: now,
        }
    }
}

/// The active plan assignment of a user. At most one per user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSubscription {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub subscription_id: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_on: DateTime<Utc>,
}

impl UserSubscription {
    pub fn new(user_id: String, subscription_id: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            subscription_id,
            created_on: now,
            updated_on: now,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HistoryChange {
    Replaced,
    Deleted,
}

/// Append-only snapshot of a subscription that was replaced or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionHistory {
    #[serde(rename = "_id")]
    pub history_id: String,
    pub user_id: String,
    pub subscription_id: String,
    pub change: HistoryChange,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub recorded_at: DateTime<Utc>,
}

impl SubscriptionHistory {
    pub fn snapshot(active: &UserSubscription, change: HistoryChange) -> Self {
        Self {
            history_id: Uuid::new_v4().to_string(),
            user_id: active.user_id.clone(),
            subscription_id: active.subscription_id.clone(),
            change,
            created_on: active.created_on,
            recorded_at: Utc::now(),
        }
    }
}

/// Per-user view counter checked against the active plan's limit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyAccessLog {
    #[serde(rename = "_id")]
    pub user_id: String,
    #[serde(default)]
    pub property_id: Option<String>,
    pub viewed_count: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_viewed: DateTime<Utc>,
}
