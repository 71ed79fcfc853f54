use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("No active subscription for user")]
    SubscriptionNotFound,

    #[error("Subscription plan not found")]
    PlanNotFound,

    #[error("Subscription plan {0} has no view limit configured")]
    PlanLimitMissing(String),

    #[error("Subscription limit of {limit} property views reached, upgrade your plan")]
    QuotaExceeded { limit: i64 },

    #[error("Subscription plan is referenced by {0} active subscriptions")]
    PlanInUse(u64),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailAlreadyRegistered,
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::from(e),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::SubscriptionNotFound => {
                AppError::NotFound(anyhow::anyhow!("No active subscription for user"))
            }
            ServiceError::PlanNotFound => {
                AppError::NotFound(anyhow::anyhow!("Subscription plan not found"))
            }
            e @ ServiceError::PlanLimitMissing(_) => AppError::InternalError(anyhow::anyhow!(e)),
            e @ ServiceError::QuotaExceeded { .. } => AppError::Forbidden(anyhow::anyhow!(e)),
            e @ ServiceError::PlanInUse(_) => AppError::Conflict(anyhow::anyhow!(e)),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
        }
    }
}
