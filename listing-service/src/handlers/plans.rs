use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use service_core::error::AppError;

use crate::{
    dtos::{
        subscription::{CreatePlanRequest, PlanResponse, UpdatePlanRequest},
        ListResponse, MessageResponse,
    },
    middleware::CurrentUser,
    models::{role::access, SubscriptionPlan},
    services::{database::is_duplicate_key, ServiceError},
    utils::ValidatedJson,
    AppState,
};

pub async fn create_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PLAN_MANAGE)?;

    let plan = SubscriptionPlan::new(req.plan_type, req.limits, req.description, req.price);
    if let Err(e) = state.db.subscription_plans().insert_one(&plan, None).await {
        if is_duplicate_key(&e) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Plan type '{}' already exists",
                plan.plan_type
            )));
        }
        return Err(e.into());
    }

    tracing::info!(
        subscription_id = %plan.subscription_id,
        plan_type = %plan.plan_type,
        limits = ?plan.limits,
        "Subscription plan created"
    );
    Ok((StatusCode::CREATED, Json(PlanResponse::from(plan))))
}

pub async fn list_plans(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PLAN_LIST)?;

    let options = FindOptions::builder().sort(doc! { "limits": 1 }).build();
    let plans: Vec<SubscriptionPlan> = state
        .db
        .subscription_plans()
        .find(doc! {}, options)
        .await?
        .try_collect()
        .await?;

    let items: Vec<PlanResponse> = plans.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

pub async fn get_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PLAN_LIST)?;

    let plan = state
        .db
        .subscription_plans()
        .find_one(doc! { "_id": &subscription_id }, None)
        .await?
        .ok_or(ServiceError::PlanNotFound)?;
    Ok(Json(PlanResponse::from(plan)))
}

/// Changes limits, description or price. Raising the limit takes effect on
/// the next metered view of every subscriber.
pub async fn update_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(subscription_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdatePlanRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PLAN_MANAGE)?;

    let mut set = doc! { "modified_on": Utc::now() };
    if let Some(limits) = req.limits {
        set.insert("limits", limits);
    }
    if let Some(description) = req.description {
        set.insert("description", description);
    }
    if let Some(price) = req.price {
        set.insert("price", price);
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let plan = state
        .db
        .subscription_plans()
        .find_one_and_update(doc! { "_id": &subscription_id }, doc! { "$set": set }, options)
        .await?
        .ok_or(ServiceError::PlanNotFound)?;

    tracing::info!(subscription_id = %subscription_id, "Subscription plan updated");
    Ok(Json(PlanResponse::from(plan)))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(subscription_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PLAN_MANAGE)?;

    let subscribers = state
        .db
        .user_subscriptions()
        .count_documents(doc! { "subscription_id": &subscription_id }, None)
        .await?;
    if subscribers > 0 {
        return Err(ServiceError::PlanInUse(subscribers).into());
    }

    let result = state
        .db
        .subscription_plans()
        .delete_one(doc! { "_id": &subscription_id }, None)
        .await?;
    if result.deleted_count == 0 {
        return Err(ServiceError::PlanNotFound.into());
    }

    tracing::info!(subscription_id = %subscription_id, "Subscription plan deleted");
    Ok(Json(MessageResponse::new("Subscription plan deleted")))
}
