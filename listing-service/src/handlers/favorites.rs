use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use service_core::error::AppError;

use crate::{
    dtos::engagement::{FavoritesRequest, FavoritesResponse},
    middleware::CurrentUser,
    models::{role::access, FavoriteProperties},
    utils::ValidatedJson,
    AppState,
};

/// Ids that are not listed properties are rejected before anything is saved.
async fn ensure_properties_exist(state: &AppState, ids: &[String]) -> Result<(), AppError> {
    let found = state
        .db
        .properties()
        .count_documents(doc! { "_id": { "$in": ids.to_vec() } }, None)
        .await?;

    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    if found != unique.len() as u64 {
        return Err(AppError::not_found("One or more properties"));
    }
    Ok(())
}

fn respond(user_id: &str, favorites: Option<FavoriteProperties>) -> FavoritesResponse {
    FavoritesResponse::new(
        user_id.to_string(),
        favorites.map(|f| f.property_ids).unwrap_or_default(),
    )
}

pub async fn list_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;

    let favorites = state
        .db
        .favorites()
        .find_one(doc! { "_id": &user.user_id }, None)
        .await?;
    Ok(Json(respond(&user.user_id, favorites)))
}

pub async fn add_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<FavoritesRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;
    ensure_properties_exist(&state, &req.property_ids).await?;

    let now = Utc::now();
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();
    let favorites = state
        .db
        .favorites()
        .find_one_and_update(
            doc! { "_id": &user.user_id },
            doc! {
                "$addToSet": { "property_ids": { "$each": req.property_ids } },
                "$set": { "updated_at": now },
                "$setOnInsert": { "created_at": now },
            },
            options,
        )
        .await?;

    Ok(Json(respond(&user.user_id, favorites)))
}

/// Replaces the whole favorites list.
pub async fn replace_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(req): ValidatedJson<FavoritesRequest>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;
    ensure_properties_exist(&state, &req.property_ids).await?;

    let mut ids = req.property_ids;
    let mut seen = std::collections::HashSet::new();
    ids.retain(|id| seen.insert(id.clone()));

    let now = Utc::now();
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();
    let favorites = state
        .db
        .favorites()
        .find_one_and_update(
            doc! { "_id": &user.user_id },
            doc! {
                "$set": { "property_ids": ids, "updated_at": now },
                "$setOnInsert": { "created_at": now },
            },
            options,
        )
        .await?;

    Ok(Json(respond(&user.user_id, favorites)))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::MEMBER)?;

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let favorites = state
        .db
        .favorites()
        .find_one_and_update(
            doc! { "_id": &user.user_id, "property_ids": &property_id },
            doc! {
                "$pull": { "property_ids": &property_id },
                "$set": { "updated_at": Utc::now() },
            },
            options,
        )
        .await?
        .ok_or_else(|| AppError::not_found("Favorite"))?;

    Ok(Json(respond(&user.user_id, Some(favorites))))
}
