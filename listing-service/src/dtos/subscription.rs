use crate::models::{HistoryChange, SubscriptionHistory, SubscriptionPlan, UserSubscription};
use crate::services::SubscriptionUsage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 50))]
    pub plan_type: String,
    #[validate(range(min = 0))]
    pub limits: i64,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

/// Plan identity (`subscription_id`, `plan_type`) cannot be changed.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdatePlanRequest {
    #[validate(range(min = 0))]
    pub limits: Option<i64>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeRequest {
    #[validate(length(min = 1))]
    pub subscription_id: String,
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub subscription_id: String,
    pub plan_type: String,
    pub limits: Option<i64>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<SubscriptionPlan> for PlanResponse {
    fn from(p: SubscriptionPlan) -> Self {
        Self {
            subscription_id: p.subscription_id,
            plan_type: p.plan_type,
            limits: p.limits,
            description: p.description,
            price: p.price,
            created_on: p.created_on,
            modified_on: p.modified_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserSubscriptionResponse {
    pub user_id: String,
    pub subscription_id: String,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

impl From<UserSubscription> for UserSubscriptionResponse {
    fn from(s: UserSubscription) -> Self {
        Self {
            user_id: s.user_id,
            subscription_id: s.subscription_id,
            created_on: s.created_on,
            updated_on: s.updated_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub message: String,
    pub subscription: UserSubscriptionResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_subscription_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history_id: String,
    pub user_id: String,
    pub subscription_id: String,
    pub change: HistoryChange,
    pub created_on: DateTime<Utc>,
    pub recorded_at: DateTime<Utc>,
}

impl From<SubscriptionHistory> for HistoryResponse {
    fn from(h: SubscriptionHistory) -> Self {
        Self {
            history_id: h.history_id,
            user_id: h.user_id,
            subscription_id: h.subscription_id,
            change: h.change,
            created_on: h.created_on,
            recorded_at: h.recorded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub subscription: UserSubscriptionResponse,
    pub plan: PlanResponse,
    pub viewed_count: i64,
    pub remaining: Option<i64>,
    pub last_viewed: Option<DateTime<Utc>>,
    pub last_property_id: Option<String>,
}

impl From<SubscriptionUsage> for UsageResponse {
    fn from(usage: SubscriptionUsage) -> Self {
        let viewed_count = usage.viewed_count();
        let remaining = usage.plan.limits.map(|l| (l - viewed_count).max(0));
        let (last_viewed, last_property_id) = match usage.access_log {
            Some(log) => (Some(log.last_viewed), log.property_id),
            None => (None, None),
        };
        Self {
            subscription: usage.subscription.into(),
            plan: usage.plan.into(),
            viewed_count,
            remaining,
            last_viewed,
            last_property_id,
        }
    }
}
