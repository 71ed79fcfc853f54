use crate::models::{
    AdCategory, AdditionalInfo, Amenities, HomeDetails, LandDetails, LocalityDetails, Property,
    PropertyDetails, PropertyKind, RentalDetails, VisitSchedule,
};
use crate::services::ViewReceipt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    pub kind: PropertyKind,
    pub ad_category: AdCategory,
    #[validate(nested)]
    pub home: HomeDetails,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UploadImagesRequest {
    #[validate(length(min = 1, max = 20))]
    pub images: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PropertySearchQuery {
    pub kind: Option<PropertyKind>,
    pub ad_category: Option<AdCategory>,
    pub city: Option<String>,
    pub locality: Option<String>,
    pub type_of_property: Option<String>,
    pub skip: Option<u64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub property_id: String,
    pub user_id: String,
    pub kind: PropertyKind,
    pub ad_category: AdCategory,
    pub home: HomeDetails,
    pub details: Option<PropertyDetails>,
    pub locality: Option<LocalityDetails>,
    pub rental: Option<RentalDetails>,
    pub amenities: Option<Amenities>,
    pub additional: Option<AdditionalInfo>,
    pub schedule: Option<VisitSchedule>,
    pub land: Option<LandDetails>,
    pub images: Vec<String>,
    pub added_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

impl From<Property> for PropertyResponse {
    fn from(p: Property) -> Self {
        Self {
            property_id: p.property_id,
            user_id: p.user_id,
            kind: p.kind,
            ad_category: p.ad_category,
            home: p.home,
            details: p.details,
            locality: p.locality,
            rental: p.rental,
            amenities: p.amenities,
            additional: p.additional,
            schedule: p.schedule,
            land: p.land,
            images: p.images,
            added_on: p.added_on,
            modified_on: p.modified_on,
            modified_by: p.modified_by,
        }
    }
}

/// Listing card data. Search results expose only this, never the full listing.
#[derive(Debug, Serialize)]
pub struct PropertySummary {
    pub property_id: String,
    pub kind: PropertyKind,
    pub ad_category: AdCategory,
    pub name: String,
    pub type_of_property: String,
    pub city: Option<String>,
    pub locality: Option<String>,
    pub price: Option<f64>,
    pub image_count: usize,
    pub added_on: DateTime<Utc>,
}

impl From<&Property> for PropertySummary {
    fn from(p: &Property) -> Self {
        Self {
            property_id: p.property_id.clone(),
            kind: p.kind,
            ad_category: p.ad_category,
            name: p.home.name.clone(),
            type_of_property: p.home.type_of_property.clone(),
            city: p.locality.as_ref().map(|l| l.city.clone()),
            locality: p.locality.as_ref().map(|l| l.locality.clone()),
            price: p.headline_price(),
            image_count: p.images.len(),
            added_on: p.added_on,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewUsage {
    pub viewed_count: i64,
    pub limit: i64,
    pub remaining: i64,
}

impl From<&ViewReceipt> for ViewUsage {
    fn from(r: &ViewReceipt) -> Self {
        Self {
            viewed_count: r.viewed_count,
            limit: r.limit,
            remaining: r.remaining(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PropertyViewResponse {
    pub property: PropertyResponse,
    /// Absent when the caller is the lister; those views are not metered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<ViewUsage>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CategoryCount {
    pub ad_category: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ImageUploadResponse {
    pub property_id: String,
    pub images: Vec<String>,
}
