use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument},
};
use service_core::error::AppError;
use uuid::Uuid;

use crate::{
    dtos::{
        property::{ImageUploadResponse, UploadImagesRequest},
        MessageResponse,
    },
    handlers::properties::{load_editable, load_property},
    middleware::CurrentUser,
    models::role::access,
    services::decode_image,
    utils::ValidatedJson,
    AppState,
};

fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

/// Decodes every image before storing any, so a bad upload stores nothing.
pub async fn upload_images(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(property_id): Path<String>,
    ValidatedJson(req): ValidatedJson<UploadImagesRequest>,
) -> Result<impl IntoResponse, AppError> {
    load_editable(&state, &user, &property_id).await?;

    let max_bytes = state.config.storage.max_image_bytes;
    let decoded = req
        .images
        .iter()
        .map(|encoded| decode_image(encoded, max_bytes))
        .collect::<Result<Vec<_>, _>>()?;

    let mut keys = Vec::with_capacity(decoded.len());
    for image in decoded {
        let key = format!(
            "properties/{}/{}.{}",
            property_id,
            Uuid::new_v4(),
            image.extension
        );
        state.storage.upload(&key, image.bytes).await?;
        keys.push(key);
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let updated = state
        .db
        .properties()
        .find_one_and_update(
            doc! { "_id": &property_id },
            doc! {
                "$push": { "images": { "$each": keys.clone() } },
                "$set": { "modified_on": Utc::now(), "modified_by": &user.user_id },
            },
            options,
        )
        .await?;

    let Some(updated) = updated else {
        for key in &keys {
            let _ = state.storage.delete(key).await;
        }
        return Err(AppError::not_found("Property"));
    };

    tracing::info!(
        property_id = %property_id,
        uploaded = keys.len(),
        "Property images uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(ImageUploadResponse {
            property_id,
            images: updated.images,
        }),
    ))
}

pub async fn download_image(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((property_id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::PROPERTY_SEARCH)?;
    let property = load_property(&state, &property_id).await?;
    let key = property
        .images
        .get(index)
        .ok_or_else(|| AppError::not_found("Image"))?;

    let bytes = state.storage.download(key).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(key))], bytes))
}

pub async fn delete_image(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((property_id, index)): Path<(String, usize)>,
) -> Result<impl IntoResponse, AppError> {
    let property = load_editable(&state, &user, &property_id).await?;
    let key = property
        .images
        .get(index)
        .cloned()
        .ok_or_else(|| AppError::not_found("Image"))?;

    state
        .db
        .properties()
        .update_one(
            doc! { "_id": &property_id },
            doc! {
                "$pull": { "images": &key },
                "$set": { "modified_on": Utc::now(), "modified_by": &user.user_id },
            },
            None,
        )
        .await?;

    if let Err(e) = state.storage.delete(&key).await {
        tracing::warn!(key = %key, error = %e, "Failed to delete stored image");
    }

    Ok(Json(MessageResponse::new("Image deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type_for("properties/p/a.png"), "image/png");
        assert_eq!(content_type_for("properties/p/a.webp"), "image/webp");
        assert_eq!(content_type_for("properties/p/a.jpg"), "image/jpeg");
    }
}
