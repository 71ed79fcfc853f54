use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use service_core::error::AppError;

use crate::{
    dtos::{
        people::{CreateOwnerRequest, OwnerResponse, UpdateOwnerRequest},
        ListResponse, MessageResponse,
    },
    middleware::CurrentUser,
    models::{role::access, Owner},
    services::database::is_duplicate_key,
    utils::ValidatedJson,
    AppState,
};

fn duplicate_owner() -> AppError {
    AppError::Conflict(anyhow::anyhow!("An owner with this email already exists"))
}

pub async fn create_owner(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateOwnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::OWNER_MANAGE)?;

    let mut owner = Owner::new(req.owner_name, req.email, user.user_id.clone());
    owner.phone = req.phone;
    owner.ownership_type = req.ownership_type;
    owner.owned_properties = req.owned_properties;
    owner.address = req.address;
    owner.emergency_contact = req.emergency_contact;

    if let Err(e) = state.db.owners().insert_one(&owner, None).await {
        if is_duplicate_key(&e) {
            return Err(duplicate_owner());
        }
        return Err(e.into());
    }

    tracing::info!(owner_id = %owner.owner_id, "Owner created");
    Ok((StatusCode::CREATED, Json(OwnerResponse::from(owner))))
}

pub async fn list_owners(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::OWNER_MANAGE)?;

    let options = FindOptions::builder().sort(doc! { "owner_name": 1 }).build();
    let owners: Vec<Owner> = state
        .db
        .owners()
        .find(doc! {}, options)
        .await?
        .try_collect()
        .await?;

    let items: Vec<OwnerResponse> = owners.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

pub async fn get_owner(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(owner_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::OWNER_MANAGE)?;

    let owner = state
        .db
        .owners()
        .find_one(doc! { "_id": &owner_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Owner"))?;

    Ok(Json(OwnerResponse::from(owner)))
}

pub async fn update_owner(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(owner_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateOwnerRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::OWNER_MANAGE)?;

    let mut set = doc! { "modified_on": Utc::now() };
    if let Some(v) = req.owner_name {
        set.insert("owner_name", v);
    }
    if let Some(v) = req.phone {
        set.insert("phone", v);
    }
    if let Some(v) = req.ownership_type {
        set.insert("ownership_type", v);
    }
    if let Some(v) = req.is_active {
        set.insert("is_active", v);
    }
    if let Some(v) = req.owned_properties {
        set.insert("owned_properties", v);
    }
    if let Some(v) = req.address {
        set.insert("address", to_bson(&v)?);
    }
    if let Some(v) = req.emergency_contact {
        set.insert("emergency_contact", to_bson(&v)?);
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let updated = state
        .db
        .owners()
        .find_one_and_update(doc! { "_id": &owner_id }, doc! { "$set": set }, options)
        .await?
        .ok_or_else(|| AppError::not_found("Owner"))?;

    tracing::info!(owner_id = %owner_id, "Owner updated");
    Ok(Json(OwnerResponse::from(updated)))
}

pub async fn delete_owner(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(owner_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::OWNER_MANAGE)?;

    let result = state
        .db
        .owners()
        .delete_one(doc! { "_id": &owner_id }, None)
        .await?;
    if result.deleted_count == 0 {
        return Err(AppError::not_found("Owner"));
    }

    tracing::info!(owner_id = %owner_id, "Owner deleted");
    Ok(Json(MessageResponse::new("Owner deleted")))
}
