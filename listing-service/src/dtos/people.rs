use crate::models::{
    ContractType, EmergencyContact, Owner, PostalAddress, RecordStatus, Tenant, UserAddress,
    UserProfile,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'));
    if allowed && (10..=15).contains(&digits) {
        Ok(())
    } else {
        Err(ValidationError::new("phone"))
    }
}

// ===== Tenants =====

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenantRequest {
    #[validate(length(min = 1, max = 100))]
    pub tenant_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub property_id: Option<String>,
    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    #[validate(range(min = 0.0))]
    pub rent_amount: Option<f64>,
    #[validate(range(min = 0.0))]
    pub lease_amount: Option<f64>,
    #[validate(range(min = 0.0))]
    pub security_deposit: Option<f64>,
    pub lease_terms: Option<String>,
    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTenantRequest {
    #[validate(length(min = 1, max = 100))]
    pub tenant_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub property_id: Option<String>,
    pub contract_type: Option<ContractType>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
    #[validate(range(min = 0.0))]
    pub rent_amount: Option<f64>,
    #[validate(range(min = 0.0))]
    pub lease_amount: Option<f64>,
    pub lease_terms: Option<String>,
    pub background_check_status: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TenantQuery {
    pub owner_id: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct TenantResponse {
    pub tenant_id: String,
    pub owner_id: String,
    pub property_id: Option<String>,
    pub tenant_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub contract_type: ContractType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_active: bool,
    pub rent_amount: Option<f64>,
    pub lease_amount: Option<f64>,
    pub security_deposit: Option<f64>,
    pub lease_terms: Option<String>,
    pub occupation: Option<String>,
    pub employer: Option<String>,
    pub background_check_status: Option<String>,
    pub notes: Option<String>,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

impl From<Tenant> for TenantResponse {
    fn from(t: Tenant) -> Self {
        Self {
            tenant_id: t.tenant_id,
            owner_id: t.owner_id,
            property_id: t.property_id,
            tenant_name: t.tenant_name,
            email: t.email,
            phone: t.phone,
            contract_type: t.contract_type,
            start_date: t.start_date,
            end_date: t.end_date,
            is_active: t.is_active,
            rent_amount: t.rent_amount,
            lease_amount: t.lease_amount,
            security_deposit: t.security_deposit,
            lease_terms: t.lease_terms,
            occupation: t.occupation,
            employer: t.employer,
            background_check_status: t.background_check_status,
            notes: t.notes,
            created_on: t.created_on,
            modified_on: t.modified_on,
            modified_by: t.modified_by,
        }
    }
}

// ===== Owners =====

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOwnerRequest {
    #[validate(length(min = 1, max = 100))]
    pub owner_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub ownership_type: Option<String>,
    #[serde(default)]
    pub owned_properties: Vec<String>,
    #[serde(default)]
    pub address: PostalAddress,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateOwnerRequest {
    #[validate(length(min = 1, max = 100))]
    pub owner_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone: Option<String>,
    pub ownership_type: Option<String>,
    pub is_active: Option<bool>,
    pub owned_properties: Option<Vec<String>>,
    pub address: Option<PostalAddress>,
    pub emergency_contact: Option<EmergencyContact>,
}

#[derive(Debug, Serialize)]
pub struct OwnerResponse {
    pub owner_id: String,
    pub owner_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub ownership_type: Option<String>,
    pub is_active: bool,
    pub owned_properties: Vec<String>,
    pub address: PostalAddress,
    pub emergency_contact: EmergencyContact,
    pub created_by: String,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl From<Owner> for OwnerResponse {
    fn from(o: Owner) -> Self {
        Self {
            owner_id: o.owner_id,
            owner_name: o.owner_name,
            email: o.email,
            phone: o.phone,
            ownership_type: o.ownership_type,
            is_active: o.is_active,
            owned_properties: o.owned_properties,
            address: o.address,
            emergency_contact: o.emergency_contact,
            created_by: o.created_by,
            created_on: o.created_on,
            modified_on: o.modified_on,
        }
    }
}

// ===== Profiles and addresses =====

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(max = 50))]
    pub last_name: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub phone_number: Option<String>,
    #[validate(url)]
    pub profile_picture: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfile> for ProfileResponse {
    fn from(p: UserProfile) -> Self {
        Self {
            user_id: p.user_id,
            first_name: p.first_name,
            last_name: p.last_name,
            phone_number: p.phone_number,
            profile_picture: p.profile_picture,
            status: p.status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpsertAddressRequest {
    #[validate(length(min = 1, max = 200))]
    pub address_1: String,
    #[validate(length(max = 200))]
    pub address_2: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub city: String,
    pub state: Option<String>,
    #[validate(length(min = 3, max = 12))]
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub user_id: String,
    pub address_1: String,
    pub address_2: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserAddress> for AddressResponse {
    fn from(a: UserAddress) -> Self {
        Self {
            user_id: a.user_id,
            address_1: a.address_1,
            address_2: a.address_2,
            city: a.city,
            state: a.state,
            postal_code: a.postal_code,
            country: a.country,
            status: a.status,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}
