use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    Rent,
    Lease,
}

/// Occupant of a property, managed by the owner who registered them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    #[serde(rename = "_id")]
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
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
}

impl Tenant {
    pub fn new(
        owner_id: String,
        tenant_name: String,
        email: String,
        contract_type: ContractType,
        start_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            tenant_id: Uuid::new_v4().to_string(),
            modified_by: owner_id.clone(),
            owner_id,
            property_id: None,
            tenant_name,
            email: email.to_lowercase(),
            phone: None,
            contract_type,
            start_date,
            end_date: None,
            is_active: true,
            rent_amount: None,
            lease_amount: None,
            security_deposit: None,
            lease_terms: None,
            occupation: None,
            employer: None,
            background_check_status: None,
            notes: None,
            created_on: now,
            modified_on: now,
        }
    }
}
