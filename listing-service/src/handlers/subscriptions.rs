use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use service_core::error::AppError;

use crate::{
    dtos::{
        subscription::{
            HistoryResponse, PlanResponse, SubscribeRequest, SubscribeResponse, UsageResponse,
            UserSubscriptionResponse,
        },
        ListResponse,
    },
    middleware::CurrentUser,
    models::role::access,
    services::SubscribeOutcome,
    utils::ValidatedJson,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct MySubscriptionResponse {
    pub subscription: UserSubscriptionResponse,
    pub plan: PlanResponse,
}

pub async fn subscribe(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<SubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::SUBSCRIBER)?;

    let outcome = state
        .subscriptions
        .subscribe(&user.user_id, &req.subscription_id)
        .await?;

    let (status, body) = match outcome {
        SubscribeOutcome::Created(current) => (
            StatusCode::CREATED,
            SubscribeResponse {
                message: "Subscribed".into(),
                subscription: current.into(),
                previous_subscription_id: None,
            },
        ),
        SubscribeOutcome::Changed {
            previous_subscription_id,
            current,
        } => (
            StatusCode::OK,
            SubscribeResponse {
                message: "Subscription plan changed".into(),
                subscription: current.into(),
                previous_subscription_id: Some(previous_subscription_id),
            },
        ),
        SubscribeOutcome::AlreadySubscribed(current) => (
            StatusCode::OK,
            SubscribeResponse {
                message: "Already subscribed to this plan".into(),
                subscription: current.into(),
                previous_subscription_id: None,
            },
        ),
    };

    Ok((status, Json(body)))
}

pub async fn get_my_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::SUBSCRIBER)?;

    let usage = state.subscriptions.usage(&user.user_id).await?;
    Ok(Json(MySubscriptionResponse {
        subscription: usage.subscription.into(),
        plan: usage.plan.into(),
    }))
}

pub async fn unsubscribe(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::SUBSCRIBER)?;

    let entry = state.subscriptions.unsubscribe(&user.user_id).await?;
    Ok(Json(HistoryResponse::from(entry)))
}

pub async fn my_history(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::SUBSCRIBER)?;

    let history = state.subscriptions.history(&user.user_id).await?;
    let items: Vec<HistoryResponse> = history.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

pub async fn my_usage(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::SUBSCRIBER)?;

    let usage = state.subscriptions.usage(&user.user_id).await?;
    Ok(Json(UsageResponse::from(usage)))
}
