use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    options::FindOptions,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        engagement::{CreateReportRequest, ReportQuery, ReportResponse},
        ListResponse, MessageResponse,
    },
    handlers::properties::load_property,
    middleware::CurrentUser,
    models::{role::access, PropertyReport},
    utils::ValidatedJson,
    AppState,
};

async fn load_report(
    state: &AppState,
    user: &CurrentUser,
    report_id: &str,
) -> Result<PropertyReport, AppError> {
    let report = state
        .db
        .property_reports()
        .find_one(doc! { "_id": report_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Report"))?;

    if !user.is_admin() && report.reported_by != user.user_id {
        return Err(AppError::not_found("Report"));
    }
    Ok(report)
}

pub async fn create_report(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreateReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::REPORT_CREATE)?;
    load_property(&state, &req.property_id).await?;

    let report = PropertyReport::new(
        req.property_id,
        user.user_id.clone(),
        req.reason,
        req.description,
    );
    state.db.property_reports().insert_one(&report, None).await?;

    tracing::warn!(
        report_id = %report.report_id,
        property_id = %report.property_id,
        "Property reported for misuse"
    );
    Ok((StatusCode::CREATED, Json(ReportResponse::from(report))))
}

pub async fn list_reports(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::REPORT_READ)?;

    let mut filter = Document::new();
    if !user.is_admin() {
        filter.insert("reported_by", user.user_id.as_str());
    }
    if let Some(property_id) = query.property_id {
        filter.insert("property_id", property_id);
    }
    if let Some(status) = query.status {
        filter.insert("status", to_bson(&status)?);
    }

    let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    let reports: Vec<PropertyReport> = state
        .db
        .property_reports()
        .find(filter, options)
        .await?
        .try_collect()
        .await?;

    let items: Vec<ReportResponse> = reports.into_iter().map(Into::into).collect();
    Ok(Json(ListResponse::from(items)))
}

pub async fn get_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(report_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::REPORT_READ)?;
    Ok(Json(ReportResponse::from(
        load_report(&state, &user, &report_id).await?,
    )))
}

pub async fn delete_report(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(report_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::REPORT_READ)?;
    load_report(&state, &user, &report_id).await?;

    state
        .db
        .property_reports()
        .delete_one(doc! { "_id": &report_id }, None)
        .await?;

    tracing::info!(report_id = %report_id, "Report deleted");
    Ok(Json(MessageResponse::new("Report deleted")))
}
