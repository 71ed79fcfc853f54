use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::FindOptions,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        admin::{
            PlanWithSubscribers, PropertyCountQuery, PropertyCountResponse, UsageStatsResponse,
            UserListResponse,
        },
        people::{TenantQuery, TenantResponse},
        subscription::UsageResponse,
        ListResponse, MessageResponse,
    },
    middleware::CurrentUser,
    models::{role::access, SubscriptionPlan, Tenant, User},
    services::{
        aggregates::{count_properties_by_category, subscribers_by_plan, subscription_overview},
        ServiceError,
    },
    AppState,
};

pub async fn list_users(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    let users: Vec<User> = state
        .db
        .users()
        .find(doc! {}, options)
        .await?
        .try_collect()
        .await?;

    Ok(Json(UserListResponse {
        total: users.len() as u64,
        users: users.into_iter().map(Into::into).collect(),
    }))
}

/// Removes the account with its subscription (archived to history), view
/// counter, profile, address and favorites. Listings stay.
pub async fn delete_user(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;
    if user_id == user.user_id {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Admins cannot delete their own account"
        )));
    }

    let result = state
        .db
        .users()
        .delete_one(doc! { "_id": &user_id }, None)
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::not_found("User"));
    }

    match state.subscriptions.unsubscribe(&user_id).await {
        Ok(_) | Err(ServiceError::SubscriptionNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let by_id = doc! { "_id": &user_id };
    state.db.access_logs().delete_one(by_id.clone(), None).await?;
    state.db.profiles().delete_one(by_id.clone(), None).await?;
    state.db.addresses().delete_one(by_id.clone(), None).await?;
    state.db.favorites().delete_one(by_id, None).await?;

    tracing::info!(user_id = %user_id, deleted_by = %user.user_id, "User deleted");
    Ok(Json(MessageResponse::new("User deleted")))
}

pub async fn user_subscription(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let usage = state.subscriptions.usage(&user_id).await?;
    Ok(Json(UsageResponse::from(usage)))
}

pub async fn plans_with_subscribers(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let options = FindOptions::builder().sort(doc! { "limits": 1 }).build();
    let plans: Vec<SubscriptionPlan> = state
        .db
        .subscription_plans()
        .find(doc! {}, options)
        .await?
        .try_collect()
        .await?;

    let mut items = Vec::with_capacity(plans.len());
    for plan in plans {
        let user_count = state
            .db
            .user_subscriptions()
            .count_documents(doc! { "subscription_id": &plan.subscription_id }, None)
            .await?;
        items.push(PlanWithSubscribers {
            plan: plan.into(),
            user_count,
        });
    }

    Ok(Json(ListResponse::from(items)))
}

pub async fn all_subscriptions(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;
    Ok(Json(ListResponse::from(subscription_overview(&state.db).await?)))
}

pub async fn property_counts(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PropertyCountQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let mut filter = Document::new();
    if let Some(kind) = query.kind {
        filter.insert("kind", kind.as_str());
    }
    if let Some(category) = query.ad_category {
        filter.insert("ad_category", category.as_str());
    }

    let total = state
        .db
        .properties()
        .count_documents(filter.clone(), None)
        .await?;
    let by_category = count_properties_by_category(&state.db, filter).await?;

    Ok(Json(PropertyCountResponse { total, by_category }))
}

pub async fn tenants_by_owner(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TenantQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let owner_id = query.owner_id.ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!("owner_id query parameter is required"))
    })?;
    let mut filter = doc! { "owner_id": owner_id };
    if let Some(active) = query.active {
        filter.insert("is_active", active);
    }

    let tenants: Vec<Tenant> = state
        .db
        .tenants()
        .find(filter, None)
        .await?
        .try_collect()
        .await?;

    let items: Vec<TenantResponse> = tenants.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

pub async fn usage_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let total_users = state.db.users().count_documents(doc! {}, None).await?;
    let total_properties = state.db.properties().count_documents(doc! {}, None).await?;
    let total_subscriptions = state
        .db
        .user_subscriptions()
        .count_documents(doc! {}, None)
        .await?;

    Ok(Json(UsageStatsResponse {
        total_users,
        total_properties,
        total_subscriptions,
        properties_by_category: count_properties_by_category(&state.db, doc! {}).await?,
        subscribers_by_plan: subscribers_by_plan(&state.db).await?,
    }))
}
