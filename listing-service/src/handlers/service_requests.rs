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
        engagement::{CreateServiceRequest, ServiceRequestResponse, UpdateServiceRequest},
        ListResponse, MessageResponse,
    },
    middleware::CurrentUser,
    models::{role::access, ServiceRequest},
    utils::ValidatedJson,
    AppState,
};

async fn load_request(
    state: &AppState,
    user: &CurrentUser,
    request_id: &str,
) -> Result<ServiceRequest, AppError> {
    let request = state
        .db
        .service_requests()
        .find_one(doc! { "_id": request_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Service request"))?;

    if !user.is_admin() && request.user_id != user.user_id {
        return Err(AppError::not_found("Service request"));
    }
    Ok(request)
}

pub async fn create_request(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;

    let request = ServiceRequest::new(
        user.user_id.clone(),
        req.issue_type,
        req.description,
        req.property_id,
    );
    state.db.service_requests().insert_one(&request, None).await?;

    tracing::info!(request_id = %request.request_id, "Service request opened");
    Ok((
        StatusCode::CREATED,
        Json(ServiceRequestResponse::from(request)),
    ))
}

pub async fn list_my_requests(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;

    let filter = if user.is_admin() {
        doc! {}
    } else {
        doc! { "user_id": &user.user_id }
    };
    let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    let requests: Vec<ServiceRequest> = state
        .db
        .service_requests()
        .find(filter, options)
        .await?
        .try_collect()
        .await?;

    let items: Vec<ServiceRequestResponse> = requests.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

pub async fn get_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;
    Ok(Json(ServiceRequestResponse::from(
        load_request(&state, &user, &request_id).await?,
    )))
}

/// Only admins move a request through its status workflow.
pub async fn update_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(request_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateServiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;
    load_request(&state, &user, &request_id).await?;

    let mut set = doc! { "updated_at": Utc::now() };
    if let Some(v) = req.issue_type {
        set.insert("issue_type", v);
    }
    if let Some(v) = req.description {
        set.insert("description", v);
    }
    if let Some(status) = req.status {
        if !user.is_admin() {
            return Err(AppError::forbidden("Only admins may change request status"));
        }
        set.insert("status", to_bson(&status)?);
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let updated = state
        .db
        .service_requests()
        .find_one_and_update(doc! { "_id": &request_id }, doc! { "$set": set }, options)
        .await?
        .ok_or_else(|| AppError::not_found("Service request"))?;

    Ok(Json(ServiceRequestResponse::from(updated)))
}

pub async fn delete_request(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(request_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;
    load_request(&state, &user, &request_id).await?;

    state
        .db
        .service_requests()
        .delete_one(doc! { "_id": &request_id }, None)
        .await?;

    tracing::info!(request_id = %request_id, "Service request deleted");
    Ok(Json(MessageResponse::new("Service request deleted")))
}
