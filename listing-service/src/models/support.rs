use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(rename = "_id")]
    pub feedback_id: String,
    pub user_id: String,
    pub email: String,
    pub feedback_type: String,
    pub message: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(user_id: String, email: String, feedback_type: String, message: String) -> Self {
        Self {
            feedback_id: Uuid::new_v4().to_string(),
            user_id,
            email,
            feedback_type,
            message,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }
}

/// A user's complaint that a listing is fraudulent or misleading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyReport {
    #[serde(rename = "_id")]
    pub report_id: String,
    pub property_id: String,
    pub reported_by: String,
    pub reason: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl PropertyReport {
    pub fn new(
        property_id: String,
        reported_by: String,
        reason: String,
        description: Option<String>,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4().to_string(),
            property_id,
            reported_by,
            reason,
            description,
            status: TicketStatus::Open,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    #[serde(rename = "_id")]
    pub request_id: String,
    pub user_id: String,
    pub issue_type: String,
    pub description: String,
    pub property_id: Option<String>,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl ServiceRequest {
    pub fn new(
        user_id: String,
        issue_type: String,
        description: String,
        property_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            request_id: Uuid::new_v4().to_string(),
            user_id,
            issue_type,
            description,
            property_id,
            status: TicketStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }
}
