pub mod admin;
pub mod auth;
pub mod favorites;
pub mod feedback;
pub mod gallery;
pub mod geocode;
pub mod health;
pub mod owners;
pub mod plans;
pub mod profiles;
pub mod properties;
pub mod reports;
pub mod service_requests;
pub mod subscriptions;
pub mod tenants;
