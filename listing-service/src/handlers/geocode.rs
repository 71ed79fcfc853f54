use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

use crate::{middleware::CurrentUser, models::role::access, models::Coordinates, AppState};

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct GeocodeResponse {
    pub address: String,
    pub coordinates: Coordinates,
    pub formatted: Option<String>,
}

pub async fn lookup(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<GeocodeQuery>,
) -> Result<impl IntoResponse, AppError> {
    user.require(access::EVERYONE)?;

    let address = query.address.trim();
    if address.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!("address is required")));
    }
    if !state.geocoder.is_enabled() {
        return Err(AppError::ServiceUnavailable);
    }

    let found = state
        .geocoder
        .geocode(address)
        .await?
        .ok_or_else(|| AppError::not_found("Address"))?;

    Ok(Json(GeocodeResponse {
        address: address.to_string(),
        coordinates: found.coordinates,
        formatted: found.formatted,
    }))
}
