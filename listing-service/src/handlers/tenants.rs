use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use service_core::error::AppError;

use crate::{
    dtos::{
        people::{CreateTenantRequest, TenantQuery, TenantResponse, UpdateTenantRequest},
        ListResponse, MessageResponse,
    },
    middleware::CurrentUser,
    models::{role::access, Tenant},
    utils::ValidatedJson,
    AppState,
};

/// Tenants are scoped to the owner who registered them; admins see all.
async fn load_tenant(
    state: &AppState,
    user: &CurrentUser,
    tenant_id: &str,
) -> Result<Tenant, AppError> {
    let tenant = state
        .db
        .tenants()
        .find_one(doc! { "_id": tenant_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Tenant"))?;

    if !user.is_admin() && tenant.owner_id != user.user_id {
        return Err(AppError::not_found("Tenant"));
    }
    Ok(tenant)
}

pub async fn create_tenant(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::TENANT_CREATE)?;

    if let Some(end) = req.end_date {
        if end < req.start_date {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "end_date must not precede start_date"
            )));
        }
    }

    let mut tenant = Tenant::new(
        user.user_id.clone(),
        req.tenant_name,
        req.email,
        req.contract_type,
        req.start_date,
    );
    tenant.phone = req.phone;
    tenant.property_id = req.property_id;
    tenant.end_date = req.end_date;
    tenant.rent_amount = req.rent_amount;
    tenant.lease_amount = req.lease_amount;
    tenant.security_deposit = req.security_deposit;
    tenant.lease_terms = req.lease_terms;
    tenant.occupation = req.occupation;
    tenant.employer = req.employer;
    tenant.notes = req.notes;

    state.db.tenants().insert_one(&tenant, None).await?;
    tracing::info!(tenant_id = %tenant.tenant_id, owner_id = %tenant.owner_id, "Tenant created");

    Ok((StatusCode::CREATED, Json(TenantResponse::from(tenant))))
}

pub async fn list_tenants(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<TenantQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::TENANT_READ)?;

    let mut filter = Document::new();
    match (user.is_admin(), query.owner_id) {
        (true, Some(owner_id)) => {
            filter.insert("owner_id", owner_id);
        }
        (true, None) => {}
        (false, _) => {
            filter.insert("owner_id", user.user_id.as_str());
        }
    }
    if let Some(active) = query.active {
        filter.insert("is_active", active);
    }

    let options = FindOptions::builder().sort(doc! { "created_on": -1 }).build();
    let tenants: Vec<Tenant> = state
        .db
        .tenants()
        .find(filter, options)
        .await?
        .try_collect()
        .await?;

    let items: Vec<TenantResponse> = tenants.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

pub async fn get_tenant(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::TENANT_READ)?;
    let tenant = load_tenant(&state, &user, &tenant_id).await?;
    Ok(Json(TenantResponse::from(tenant)))
}

pub async fn update_tenant(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tenant_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateTenantRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::TENANT_UPDATE)?;
    let current = load_tenant(&state, &user, &tenant_id).await?;

    if let Some(end) = req.end_date {
        if end < current.start_date {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "end_date must not precede start_date"
            )));
        }
    }

    let mut set = doc! {
        "modified_on": Utc::now(),
        "modified_by": &user.user_id,
    };
    if let Some(v) = req.tenant_name {
        set.insert("tenant_name", v);
    }
    if let Some(v) = req.phone {
        set.insert("phone", v);
    }
    if let Some(v) = req.property_id {
        set.insert("property_id", v);
    }
    if let Some(v) = req.contract_type {
        set.insert("contract_type", mongodb::bson::to_bson(&v)?);
    }
    if let Some(v) = req.end_date {
        set.insert("end_date", v.to_string());
    }
    if let Some(v) = req.is_active {
        set.insert("is_active", v);
    }
    if let Some(v) = req.rent_amount {
        set.insert("rent_amount", v);
    }
    if let Some(v) = req.lease_amount {
        set.insert("lease_amount", v);
    }
    if let Some(v) = req.lease_terms {
        set.insert("lease_terms", v);
    }
    if let Some(v) = req.background_check_status {
        set.insert("background_check_status", v);
    }
    if let Some(v) = req.notes {
        set.insert("notes", v);
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let updated = state
        .db
        .tenants()
        .find_one_and_update(doc! { "_id": &tenant_id }, doc! { "$set": set }, options)
        .await?
        .ok_or_else(|| AppError::not_found("Tenant"))?;

    tracing::info!(tenant_id = %tenant_id, "Tenant updated");
    Ok(Json(TenantResponse::from(updated)))
}

pub async fn delete_tenant(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(tenant_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::TENANT_DELETE)?;
    load_tenant(&state, &user, &tenant_id).await?;

    state
        .db
        .tenants()
        .delete_one(doc! { "_id": &tenant_id }, None)
        .await?;

    tracing::info!(tenant_id = %tenant_id, "Tenant deleted");
    Ok(Json(MessageResponse::new("Tenant deleted")))
}
