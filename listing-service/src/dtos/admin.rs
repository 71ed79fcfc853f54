use crate::dtos::property::CategoryCount;
use crate::dtos::subscription::PlanResponse;
use crate::models::SanitizedUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<SanitizedUser>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct PlanWithSubscribers {
    #[serde(flatten)]
    pub plan: PlanResponse,
    pub user_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct PropertyCountQuery {
    pub kind: Option<crate::models::PropertyKind>,
    pub ad_category: Option<crate::models::AdCategory>,
}

#[derive(Debug, Serialize)]
pub struct PropertyCountResponse {
    pub total: u64,
    pub by_category: Vec<CategoryCount>,
}

/// One row of the subscriptions overview: who is on which plan.
#[derive(Debug, Serialize)]
pub struct SubscriptionOverview {
    pub user_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub subscription_id: String,
    pub plan_type: Option<String>,
    pub limits: Option<i64>,
    pub viewed_count: i64,
    pub created_on: DateTime<Utc>,
    pub updated_on: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PlanUsage {
    pub plan_type: String,
    pub subscribers: i64,
}

#[derive(Debug, Serialize)]
pub struct UsageStatsResponse {
    pub total_users: u64,
    pub total_properties: u64,
    pub total_subscriptions: u64,
    pub properties_by_category: Vec<CategoryCount>,
    pub subscribers_by_plan: Vec<PlanUsage>,
}
