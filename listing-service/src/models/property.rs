use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    Apartment,
    House,
    Land,
}

impl PropertyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyKind::Apartment => "apartment",
            PropertyKind::House => "house",
            PropertyKind::Land => "land",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdCategory {
    Rent,
    Lease,
    Sale,
    Resale,
    PgHostel,
    Flatmates,
}

impl AdCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdCategory::Rent => "rent",
            AdCategory::Lease => "lease",
            AdCategory::Sale => "sale",
            AdCategory::Resale => "resale",
            AdCategory::PgHostel => "pg_hostel",
            AdCategory::Flatmates => "flatmates",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct HomeDetails {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(min = 10, max = 15))]
    pub phone_number: String,
    #[validate(length(min = 1, max = 100))]
    pub type_of_property: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct PropertyDetails {
    pub property_type: Option<String>,
    pub bhk_type: Option<String>,
    #[validate(range(min = -5, max = 300))]
    pub floor: Option<i32>,
    #[validate(range(min = 0, max = 300))]
    pub total_floors: Option<i32>,
    pub property_age: Option<String>,
    pub facing: Option<String>,
    #[validate(range(min = 0.0))]
    pub total_area: Option<f64>,
    pub apartment_name: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct LocalityDetails {
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    #[validate(length(min = 1, max = 200))]
    pub locality: String,
    pub area: Option<String>,
    pub landmark: Option<String>,
    pub street: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub formatted_address: Option<String>,
}

impl LocalityDetails {
    /// Free-text address handed to the geocoder.
    pub fn geocode_query(&self) -> String {
        [
            self.street.as_deref(),
            self.landmark.as_deref(),
            self.area.as_deref(),
            Some(self.locality.as_str()),
            Some(self.city.as_str()),
            self.postal_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct RentalDetails {
    #[validate(range(min = 0.0))]
    pub expected_rent: Option<f64>,
    #[validate(range(min = 0.0))]
    pub expected_deposit: Option<f64>,
    #[validate(range(min = 0.0))]
    pub expected_price: Option<f64>,
    #[serde(default)]
    pub rent_negotiable: bool,
    pub monthly_maintenance: Option<String>,
    pub available_from: Option<NaiveDate>,
    #[serde(default)]
    pub preferred_tenants: Vec<String>,
    pub furnishing: Option<String>,
    pub parking: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct Amenities {
    #[validate(range(min = 0, max = 50))]
    pub bathrooms: Option<i32>,
    #[validate(range(min = 0, max = 50))]
    pub balconies: Option<i32>,
    pub water_supply: Option<String>,
    #[serde(default)]
    pub gym: bool,
    #[serde(default)]
    pub non_veg_allowed: bool,
    #[serde(default)]
    pub gated_security: bool,
    pub power_backup: Option<String>,
    #[serde(default)]
    pub extras: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct AdditionalInfo {
    pub khata_certificate: Option<String>,
    pub sale_deed_certificate: Option<String>,
    pub property_tax_paid: Option<bool>,
    pub occupancy_certificate: Option<String>,
    pub who_will_show: Option<String>,
    #[validate(length(min = 10, max = 15))]
    pub secondary_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct VisitSchedule {
    #[serde(default)]
    pub available_days: Vec<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(default)]
    pub available_all_day: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
pub struct LandDetails {
    #[validate(range(min = 0.0))]
    pub plot_area: Option<f64>,
    pub area_unit: Option<String>,
    pub plot_length: Option<f64>,
    pub plot_width: Option<f64>,
    pub boundary_wall: Option<bool>,
    pub road_width: Option<f64>,
    pub zoning: Option<String>,
}

/// A listing. Sections are filled in independently after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "_id")]
    pub property_id: String,
    pub user_id: String,
    pub kind: PropertyKind,
    pub ad_category: AdCategory,
    pub home: HomeDetails,
    #[serde(default)]
    pub details: Option<PropertyDetails>,
    #[serde(default)]
    pub locality: Option<LocalityDetails>,
    #[serde(default)]
    pub rental: Option<RentalDetails>,
    #[serde(default)]
    pub amenities: Option<Amenities>,
    #[serde(default)]
    pub additional: Option<AdditionalInfo>,
    #[serde(default)]
    pub schedule: Option<VisitSchedule>,
    #[serde(default)]
    pub land: Option<LandDetails>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub added_on: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

impl Property {
    pub fn new(
        user_id: String,
        kind: PropertyKind,
        ad_category: AdCategory,
        home: HomeDetails,
    ) -> Self {
        let now = Utc::now();
        Self {
            property_id: Uuid::new_v4().to_string(),
            modified_by: user_id.clone(),
            user_id,
            kind,
            ad_category,
            home,
            details: None,
            locality: None,
            rental: None,
            amenities: None,
            additional: None,
            schedule: None,
            land: None,
            images: Vec::new(),
            added_on: now,
            modified_on: now,
        }
    }

    /// Price shown in listings: rent for rentals, asking price otherwise.
    pub fn headline_price(&self) -> Option<f64> {
        let rental = self.rental.as_ref()?;
        match self.ad_category {
            AdCategory::Rent | AdCategory::PgHostel | AdCategory::Flatmates => {
                rental.expected_rent
            }
            AdCategory::Lease | AdCategory::Sale | AdCategory::Resale => rental
                .expected_price
                .or(rental.expected_deposit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> HomeDetails {
        HomeDetails {
            name: "Sunrise Residency".into(),
            phone_number: "9876543210".into(),
            type_of_property: "residential".into(),
        }
    }

    #[test]
    fn geocode_query_skips_blank_parts() {
        let locality = LocalityDetails {
            city: "Bengaluru".into(),
            locality: "Indiranagar".into(),
            area: Some("  ".into()),
            landmark: Some("Metro station".into()),
            ..Default::default()
        };
        assert_eq!(
            locality.geocode_query(),
            "Metro station, Indiranagar, Bengaluru"
        );
    }

    #[test]
    fn headline_price_depends_on_ad_category() {
        let mut property = Property::new(
            "u1".into(),
            PropertyKind::Apartment,
            AdCategory::Rent,
            home(),
        );
        assert_eq!(property.headline_price(), None);

        property.rental = Some(RentalDetails {
            expected_rent: Some(25_000.0),
            expected_price: Some(9_000_000.0),
            ..Default::default()
        });
        assert_eq!(property.headline_price(), Some(25_000.0));

        property.ad_category = AdCategory::Sale;
        assert_eq!(property.headline_price(), Some(9_000_000.0));
    }

    #[test]
    fn home_details_require_ten_digit_phone() {
        let mut details = home();
        assert!(details.validate().is_ok());
        details.phone_number = "12345".into();
        assert!(details.validate().is_err());
    }

    #[test]
    fn ad_category_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AdCategory::PgHostel).unwrap(),
            "\"pg_hostel\""
        );
    }
}
