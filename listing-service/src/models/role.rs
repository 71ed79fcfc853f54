use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform roles carried in access tokens and stored on users.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Vendor,
    Owner,
    Customer,
    PropertyManager,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::Admin,
        Role::Vendor,
        Role::Owner,
        Role::Customer,
        Role::PropertyManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Vendor => "vendor",
            Role::Owner => "owner",
            Role::Customer => "customer",
            Role::PropertyManager => "property_manager",
        }
    }

    /// Roles a user may pick for themselves at registration.
    pub fn is_self_assignable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown role: {}", s))
    }
}

/// Role sets per operation. Route handlers check the caller against one of these.
pub mod access {
    use super::Role::{self, *};

    pub const EVERYONE: &[Role] = &Role::ALL;
    pub const ADMIN_ONLY: &[Role] = &[Admin];

    pub const PROPERTY_CREATE: &[Role] = &[Admin, Vendor, Owner, Customer, PropertyManager];
    pub const PROPERTY_EDIT: &[Role] = &[Admin, Vendor, Owner, Customer, PropertyManager];
    /// Metered detail view; every role here must also be able to subscribe.
    pub const PROPERTY_VIEW: &[Role] = &[Admin, Vendor, Owner, Customer];
    pub const PROPERTY_SEARCH: &[Role] = &[Admin, Vendor, Owner, Customer, PropertyManager];

    pub const TENANT_CREATE: &[Role] = &[Admin, Owner];
    pub const TENANT_READ: &[Role] = &[Admin, Vendor, Owner, Customer];
    pub const TENANT_UPDATE: &[Role] = &[Admin, Vendor, Owner, Customer];
    pub const TENANT_DELETE: &[Role] = &[Admin, Owner];

    pub const OWNER_MANAGE: &[Role] = &[Admin, PropertyManager, Owner];

    pub const MEMBER: &[Role] = &[Admin, Vendor, Owner, Customer];

    pub const REPORT_CREATE: &[Role] = &[Customer, Owner];
    pub const REPORT_READ: &[Role] = &[Admin, Customer, Owner];

    pub const PLAN_MANAGE: &[Role] = &[Admin];
    pub const PLAN_LIST: &[Role] = &Role::ALL;

    pub const SUBSCRIBER: &[Role] = &[Admin, Vendor, Owner, Customer];
}
