pub mod favorite;
pub mod owner;
pub mod profile;
pub mod property;
pub mod role;
pub mod subscription;
pub mod support;
pub mod tenant;
pub mod user;

pub use favorite::FavoriteProperties;
pub use support::{Feedback, PropertyReport, ServiceRequest, TicketStatus};
pub use owner::{EmergencyContact, Owner, PostalAddress};
pub use profile::{RecordStatus, UserAddress, UserProfile};
pub use property::{
    AdCategory, AdditionalInfo, Amenities, Coordinates, HomeDetails, LandDetails,
    LocalityDetails, Property, PropertyDetails, PropertyKind, RentalDetails, VisitSchedule,
};
pub use role::Role;
pub use subscription::{
    HistoryChange, PropertyAccessLog, SubscriptionHistory, SubscriptionPlan, UserSubscription,
};
pub use tenant::{ContractType, Tenant};
pub use user::{SanitizedUser, User};
