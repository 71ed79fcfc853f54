use crate::models::{Feedback, PropertyReport, ServiceRequest, TicketStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct FavoritesRequest {
    #[validate(length(min = 1, max = 100))]
    pub property_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub user_id: String,
    pub property_ids: Vec<String>,
    pub total: usize,
}

impl FavoritesResponse {
    pub fn new(user_id: String, property_ids: Vec<String>) -> Self {
        Self {
            user_id,
            total: property_ids.len(),
            property_ids,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    #[validate(length(min = 1, max = 50))]
    pub feedback_type: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub feedback_id: String,
    pub user_id: String,
    pub email: String,
    pub feedback_type: String,
    pub message: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            feedback_id: f.feedback_id,
            user_id: f.user_id,
            email: f.email,
            feedback_type: f.feedback_type,
            message: f.message,
            status: f.status,
            created_at: f.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    #[validate(length(min = 1))]
    pub property_id: String,
    #[validate(length(min = 1, max = 100))]
    pub reason: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub property_id: Option<String>,
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub report_id: String,
    pub property_id: String,
    pub reported_by: String,
    pub reason: String,
    pub description: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}

impl From<PropertyReport> for ReportResponse {
    fn from(r: PropertyReport) -> Self {
        Self {
            report_id: r.report_id,
            property_id: r.property_id,
            reported_by: r.reported_by,
            reason: r.reason,
            description: r.description,
            status: r.status,
            created_at: r.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 50))]
    pub issue_type: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    pub property_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 50))]
    pub issue_type: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
}

#[derive(Debug, Serialize)]
pub struct ServiceRequestResponse {
    pub request_id: String,
    pub user_id: String,
    pub issue_type: String,
    pub description: String,
    pub property_id: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ServiceRequest> for ServiceRequestResponse {
    fn from(s: ServiceRequest) -> Self {
        Self {
            request_id: s.request_id,
            user_id: s.user_id,
            issue_type: s.issue_type,
            description: s.description,
            property_id: s.property_id,
            status: s.status,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}
