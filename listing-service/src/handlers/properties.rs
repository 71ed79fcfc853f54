use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_bson, Document},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
};
use serde::Serialize;
use service_core::error::AppError;

use crate::{
    dtos::{
        property::{
            CreatePropertyRequest, PropertyResponse, PropertySearchQuery, PropertySummary,
            PropertyViewResponse, ViewUsage,
        },
        ListResponse, MessageResponse, Pagination,
    },
    middleware::CurrentUser,
    models::{
        role::access, AdditionalInfo, Amenities, LandDetails, LocalityDetails, Property,
        PropertyDetails, PropertyKind, RentalDetails, VisitSchedule,
    },
    services::aggregates::{count_properties_by_category, exact_ci},
    utils::ValidatedJson,
    AppState,
};

pub(crate) async fn load_property(state: &AppState, property_id: &str) -> Result<Property, AppError> {
    state
        .db
        .properties()
        .find_one(doc! { "_id": property_id }, None)
        .await?
        .ok_or_else(|| AppError::not_found("Property"))
}

/// Loads a listing the caller is allowed to modify.
pub(crate) async fn load_editable(
    state: &AppState,
    user: &CurrentUser,
    property_id: &str,
) -> Result<Property, AppError> {
    user.require(access::PROPERTY_EDIT)?;
    let property = load_property(state, property_id).await?;
    user.require_owner_or_admin(&property.user_id)?;
    Ok(property)
}

/// Replaces one section sub-document and returns the updated listing.
async fn set_section<T: Serialize>(
    state: &AppState,
    user: &CurrentUser,
    property_id: &str,
    field: &str,
    value: &T,
) -> Result<PropertyResponse, AppError> {
    let mut set = Document::new();
    set.insert(field, to_bson(value)?);
    set.insert("modified_on", Utc::now());
    set.insert("modified_by", user.user_id.as_str());

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();

    let updated = state
        .db
        .properties()
        .find_one_and_update(doc! { "_id": property_id }, doc! { "$set": set }, options)
        .await?
        .ok_or_else(|| AppError::not_found("Property"))?;

    tracing::info!(property_id = %property_id, section = field, "Property section updated");
    Ok(updated.into())
}

pub async fn create_property(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<CreatePropertyRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PROPERTY_CREATE)?;

    let property = Property::new(user.user_id.clone(), req.kind, req.ad_category, req.home);
    state.db.properties().insert_one(&property, None).await?;

    tracing::info!(
        property_id = %property.property_id,
        kind = property.kind.as_str(),
        ad_category = property.ad_category.as_str(),
        "Property listed"
    );

    Ok((StatusCode::CREATED, Json(PropertyResponse::from(property))))
}

/// Full listing, counted against the caller's subscription plan. The lister
/// reading their own listing is not counted.
pub async fn view_property(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PROPERTY_VIEW)?;

    let property = load_property(&state, &property_id).await?;

    let usage = if property.user_id == user.user_id {
        None
    } else {
        let receipt = state
            .subscriptions
            .record_view(&user.user_id, &property_id)
            .await?;
        Some(ViewUsage::from(&receipt))
    };

    Ok(Json(PropertyViewResponse {
        property: property.into(),
        usage,
    }))
}

pub async fn search_properties(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<PropertySearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PROPERTY_SEARCH)?;

    let mut filter = Document::new();
    if let Some(kind) = query.kind {
        filter.insert("kind", kind.as_str());
    }
    if let Some(category) = query.ad_category {
        filter.insert("ad_category", category.as_str());
    }
    if let Some(city) = query.city.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert("locality.city", exact_ci(city));
    }
    if let Some(locality) = query.locality.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert("locality.locality", exact_ci(locality));
    }
    if let Some(kind) = query.type_of_property.as_deref().filter(|s| !s.trim().is_empty()) {
        filter.insert("home.type_of_property", exact_ci(kind));
    }

    let page = Pagination {
        skip: query.skip,
        limit: query.limit,
    };
    let options = FindOptions::builder()
        .sort(doc! { "added_on": -1 })
        .skip(page.skip())
        .limit(page.limit())
        .build();

    let cursor = state.db.properties().find(filter, options).await?;
    let properties: Vec<Property> = cursor.try_collect().await?;
    let summaries: Vec<PropertySummary> = properties.iter().map(PropertySummary::from).collect();

    Ok(Json(ListResponse::from(summaries)))
}

pub async fn my_properties(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PROPERTY_CREATE)?;

    let options = FindOptions::builder().sort(doc! { "added_on": -1 }).build();
    let cursor = state
        .db
        .properties()
        .find(doc! { "user_id": &user.user_id }, options)
        .await?;
    let properties: Vec<Property> = cursor.try_collect().await?;
    let responses: Vec<PropertyResponse> = properties.into_iter().map(Into::into).collect();

    Ok(Json(ListResponse::from(responses)))
}

pub async fn my_property_counts(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PROPERTY_CREATE)?;
    let counts =
        count_properties_by_category(&state.db, doc! { "user_id": &user.user_id }).await?;
    Ok(Json(ListResponse::from(counts)))
}

pub async fn delete_property(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let property = load_editable(&state, &user, &property_id).await?;

    state
        .db
        .properties()
        .delete_one(doc! { "_id": &property_id }, None)
        .await?;

    state
        .db
        .favorites()
        .update_many(
            doc! { "property_ids": &property_id },
            doc! { "$pull": { "property_ids": &property_id } },
            None,
        )
        .await?;

    for key in &property.images {
        if let Err(e) = state.storage.delete(key).await {
            tracing::warn!(key = %key, error = %e, "Failed to delete property image");
        }
    }

    tracing::info!(property_id = %property_id, "Property deleted");
    Ok(Json(MessageResponse::new("Property deleted")))
}

pub async fn update_details(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(req): ValidatedJson<PropertyDetails>,
) -> Result<impl IntoResponse, AppError> {
    load_editable(&state, &user, &property_id).await?;
    Ok(Json(
        set_section(&state, &user, &property_id, "details", &req).await?,
    ))
}

/// Stores the locality, enriched with coordinates when the geocoder finds the
/// address. A geocoding failure is logged and the locality saved without them.
pub async fn update_locality(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(mut req): ValidatedJson<LocalityDetails>,
) -> Result<impl IntoResponse, AppError> {
    load_editable(&state, &user, &property_id).await?;

    req.coordinates = None;
    req.formatted_address = None;
    if state.geocoder.is_enabled() {
        match state.geocoder.geocode(&req.geocode_query()).await {
            Ok(Some(found)) => {
                req.coordinates = Some(found.coordinates);
                req.formatted_address = found.formatted;
            }
            Ok(None) => tracing::info!(property_id = %property_id, "Locality not geocoded"),
            Err(e) => tracing::warn!(
                property_id = %property_id,
                error = %e,
                "Geocoding failed, saving locality without coordinates"
            ),
        }
    }

    Ok(Json(
        set_section(&state, &user, &property_id, "locality", &req).await?,
    ))
}

pub async fn update_rental(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(req): ValidatedJson<RentalDetails>,
) -> Result<impl IntoResponse, AppError> {
    load_editable(&state, &user, &property_id).await?;
    Ok(Json(
        set_section(&state, &user, &property_id, "rental", &req).await?,
    ))
}

pub async fn update_amenities(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(req): ValidatedJson<Amenities>,
) -> Result<impl IntoResponse, AppError> {
    load_editable(&state, &user, &property_id).await?;
    Ok(Json(
        set_section(&state, &user, &property_id, "amenities", &req).await?,
    ))
}

pub async fn update_additional(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(req): ValidatedJson<AdditionalInfo>,
) -> Result<impl IntoResponse, AppError> {
    load_editable(&state, &user, &property_id).await?;
    Ok(Json(
        set_section(&state, &user, &property_id, "additional", &req).await?,
    ))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(req): ValidatedJson<VisitSchedule>,
) -> Result<impl IntoResponse, AppError> {
    load_editable(&state, &user, &property_id).await?;
    Ok(Json(
        set_section(&state, &user, &property_id, "schedule", &req).await?,
    ))
}

pub async fn update_land(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(req): ValidatedJson<LandDetails>,
) -> Result<impl IntoResponse, AppError> {
    let property = load_editable(&state, &user, &property_id).await?;
    if property.kind != PropertyKind::Land {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Land details only apply to land listings"
        )));
    }
    Ok(Json(
        set_section(&state, &user, &property_id, "land", &req).await?,
    ))
}
