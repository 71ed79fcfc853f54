pub mod aggregates;
pub mod database;
pub mod error;
pub mod geocoding;
pub mod jwt;
pub mod metrics;
pub mod storage;
pub mod subscription_store;
pub mod subscriptions;

pub use database::MongoDb;
pub use error::ServiceError;
pub use geocoding::{DisabledGeocoder, GeocodeResult, Geocoder, OpenCageGeocoder};
pub use jwt::{AccessTokenClaims, JwtService, TokenResponse};
pub use metrics::{get_metrics, init_metrics};
pub use storage::{decode_image, ImageStorage, LocalStorage};
pub use subscription_store::{
    InMemorySubscriptionStore, MongoSubscriptionStore, SubscriptionStore,
};
pub use subscriptions::{SubscribeOutcome, SubscriptionService, SubscriptionUsage, ViewReceipt};
