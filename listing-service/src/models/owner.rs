use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PostalAddress {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EmergencyContact {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub relation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "_id")]
    pub owner_id: String,
    pub owner_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub ownership_type: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub owned_properties: Vec<String>,
    #[serde(default)]
    pub address: PostalAddress,
    #[serde(default)]
    pub emergency_contact: EmergencyContact,
    pub created_by: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_on: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_on: DateTime<Utc>,
}

impl Owner {
    pub fn new(owner_name: String, email: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            owner_id: Uuid::new_v4().to_string(),
            owner_name,
            email: email.to_lowercase(),
            phone: None,
            ownership_type: None,
            is_active: true,
            owned_properties: Vec::new(),
            address: PostalAddress::default(),
            emergency_contact: EmergencyContact::default(),
            created_by,
            created_on: now,
            modified_on: now,
        }
    }
}
