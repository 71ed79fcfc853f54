use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use service_core::error::AppError;

use crate::{
    dtos::{
        people::{AddressResponse, ProfileResponse, UpsertAddressRequest, UpsertProfileRequest},
        ListResponse, MessageResponse,
    },
    middleware::CurrentUser,
    models::{role::access, RecordStatus, UserAddress, UserProfile},
    utils::ValidatedJson,
    AppState,
};

fn upsert_after() -> FindOneAndUpdateOptions {
    FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build()
}

// ===== Profiles =====

async fn find_profile(state: &AppState, user_id: &str) -> Result<UserProfile, AppError> {
    state
        .db
        .profiles()
        .find_one(doc! { "_id": user_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Profile"))
}

pub async fn get_my_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;
    Ok(Json(ProfileResponse::from(
        find_profile(&state, &user.user_id).await?,
    )))
}

/// Creates the caller's profile or replaces its fields.
pub async fn upsert_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<UpsertProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;

    let now = Utc::now();
    let status = to_bson(&req.status.unwrap_or_default())?;
    let profile = state
        .db
        .profiles()
        .find_one_and_update(
            doc! { "_id": &user.user_id },
            doc! {
                "$set": {
                    "first_name": req.first_name,
                    "last_name": req.last_name,
                    "phone_number": req.phone_number,
                    "profile_picture": req.profile_picture,
                    "status": status,
                    "updated_at": now,
                },
                "$setOnInsert": { "created_at": now },
            },
            upsert_after(),
        )
        .await?
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Profile upsert returned nothing")))?;

    tracing::info!(user_id = %user.user_id, "Profile saved");
    Ok(Json(ProfileResponse::from(profile)))
}

pub async fn delete_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;

    let result = state
        .db
        .profiles()
        .delete_one(doc! { "_id": &user.user_id }, None)
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::not_found("Profile"));
    }

    tracing::info!(user_id = %user.user_id, "Profile deleted");
    Ok(Json(MessageResponse::new("Profile deleted")))
}

pub async fn get_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;
    user.require_owner_or_admin(&user_id)?;
    Ok(Json(ProfileResponse::from(find_profile(&state, &user_id).await?)))
}

pub async fn list_profiles(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let profiles: Vec<UserProfile> = state
        .db
        .profiles()
        .find(doc! {}, None)
        .await?
        .try_collect()
        .await?;
    let items: Vec<ProfileResponse> = profiles.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

// ===== Addresses =====

async fn find_address(state: &AppState, user_id: &str) -> Result<UserAddress, AppError> {
    state
        .db
        .addresses()
        .find_one(doc! { "_id": user_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Address"))
}

pub async fn get_my_address(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;
    Ok(Json(AddressResponse::from(
        find_address(&state, &user.user_id).await?,
    )))
}

pub async fn upsert_address(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<UpsertAddressRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;

    let now = Utc::now();
    let status = to_bson(&req.status.unwrap_or(RecordStatus::Active))?;
    let address = state
        .db
        .addresses()
        .find_one_and_update(
            doc! { "_id": &user.user_id },
            doc! {
                "$set": {
                    "address_1": req.address_1,
                    "address_2": req.address_2,
                    "city": req.city,
                    "state": req.state,
                    "postal_code": req.postal_code,
                    "country": req.country,
                    "status": status,
                    "updated_at": now,
                },
                "$setOnInsert": { "created_at": now },
            },
            upsert_after(),
        )
        .await?
        .ok_or_else(|| AppError::InternalError(anyhow::anyhow!("Address upsert returned nothing")))?;

    tracing::info!(user_id = %user.user_id, "Address saved");
    Ok(Json(AddressResponse::from(address)))
}

pub async fn get_address(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;
    user.require_owner_or_admin(&user_id)?;
    Ok(Json(AddressResponse::from(find_address(&state, &user_id).await?)))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::ADMIN_ONLY)?;

    let addresses: Vec<UserAddress> = state
        .db
        .addresses()
        .find(doc! {}, None)
        .await?
        .try_collect()
        .await?;
    let items: Vec<AddressResponse> = addresses.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}
