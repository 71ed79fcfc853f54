pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ListingConfig;
use crate::services::{
    DisabledGeocoder, Geocoder, ImageStorage, JwtService, LocalStorage, MongoDb,
    MongoSubscriptionStore, OpenCageGeocoder, SubscriptionService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: ListingConfig,
    pub db: MongoDb,
    pub jwt: JwtService,
    pub subscriptions: SubscriptionService,
    pub geocoder: Arc<dyn Geocoder>,
    pub storage: Arc<dyn ImageStorage>,
    pub auth_rate_limiter: IpRateLimiter,
}

impl AppState {
    /// Wires the production services around an already connected database.
    pub async fn new(config: ListingConfig, db: MongoDb) -> Result<Self, AppError> {
        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;

        let geocoder: Arc<dyn Geocoder> = match &config.geocoding.api_key {
            Some(key) => Arc::new(OpenCageGeocoder::new(&config.geocoding, key.clone())?),
            None => {
                tracing::warn!("GEOCODING_API_KEY not set, geocoding disabled");
                Arc::new(DisabledGeocoder)
            }
        };

        let storage: Arc<dyn ImageStorage> = Arc::new(
            LocalStorage::new(&config.storage.local_path)
                .await
                .map_err(|e| {
                    tracing::error!(
                        "Failed to initialize local storage at {}: {}",
                        config.storage.local_path,
                        e
                    );
                    e
                })?,
        );

        let subscriptions =
            SubscriptionService::new(Arc::new(MongoSubscriptionStore::new(db.clone())));

        let auth_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.auth_attempts,
            config.rate_limit.auth_window_seconds,
        );

        Ok(Self {
            config,
            db,
            jwt,
            subscriptions,
            geocoder,
            storage,
            auth_rate_limiter,
        })
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.auth_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let protected = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        // Properties
        .route(
            "/api/properties",
            get(handlers::properties::search_properties)
                .post(handlers::properties::create_property),
        )
        .route("/api/properties/mine", get(handlers::properties::my_properties))
        .route(
            "/api/properties/mine/counts",
            get(handlers::properties::my_property_counts),
        )
        .route(
            "/api/properties/:property_id",
            get(handlers::properties::view_property).delete(handlers::properties::delete_property),
        )
        .route(
            "/api/properties/:property_id/details",
            put(handlers::properties::update_details),
        )
        .route(
            "/api/properties/:property_id/locality",
            put(handlers::properties::update_locality),
        )
        .route(
            "/api/properties/:property_id/rental",
            put(handlers::properties::update_rental),
        )
        .route(
            "/api/properties/:property_id/amenities",
            put(handlers::properties::update_amenities),
        )
        .route(
            "/api/properties/:property_id/additional",
            put(handlers::properties::update_additional),
        )
        .route(
            "/api/properties/:property_id/schedule",
            put(handlers::properties::update_schedule),
        )
        .route(
            "/api/properties/:property_id/land",
            put(handlers::properties::update_land),
        )
        .route(
            "/api/properties/:property_id/images",
            post(handlers::gallery::upload_images),
        )
        .route(
            "/api/properties/:property_id/images/:index",
            get(handlers::gallery::download_image).delete(handlers::gallery::delete_image),
        )
        .route("/api/geocode", get(handlers::geocode::lookup))
        // People
        .route(
            "/api/tenants",
            get(handlers::tenants::list_tenants).post(handlers::tenants::create_tenant),
        )
        .route(
            "/api/tenants/:tenant_id",
            get(handlers::tenants::get_tenant)
                .patch(handlers::tenants::update_tenant)
                .delete(handlers::tenants::delete_tenant),
        )
        .route(
            "/api/owners",
            get(handlers::owners::list_owners).post(handlers::owners::create_owner),
        )
        .route(
            "/api/owners/:owner_id",
            get(handlers::owners::get_owner)
                .patch(handlers::owners::update_owner)
                .delete(handlers::owners::delete_owner),
        )
        .route("/api/profiles", get(handlers::profiles::list_profiles))
        .route(
            "/api/profiles/me",
            get(handlers::profiles::get_my_profile)
                .put(handlers::profiles::upsert_profile)
                .delete(handlers::profiles::delete_profile),
        )
        .route("/api/profiles/:user_id", get(handlers::profiles::get_profile))
        .route("/api/addresses", get(handlers::profiles::list_addresses))
        .route(
            "/api/addresses/me",
            get(handlers::profiles::get_my_address).put(handlers::profiles::upsert_address),
        )
        .route("/api/addresses/:user_id", get(handlers::profiles::get_address))
        // Engagement
        .route(
            "/api/favorites",
            get(handlers::favorites::list_favorites)
                .post(handlers::favorites::add_favorites)
                .put(handlers::favorites::replace_favorites),
        )
        .route(
            "/api/favorites/:property_id",
            delete(handlers::favorites::remove_favorite),
        )
        .route(
            "/api/feedback",
            get(handlers::feedback::list_feedback).post(handlers::feedback::submit_feedback),
        )
        .route(
            "/api/reports",
            get(handlers::reports::list_reports).post(handlers::reports::create_report),
        )
        .route(
            "/api/reports/:report_id",
            get(handlers::reports::get_report).delete(handlers::reports::delete_report),
        )
        .route(
            "/api/service-requests",
            get(handlers::service_requests::list_my_requests)
                .post(handlers::service_requests::create_request),
        )
        .route(
            "/api/service-requests/:request_id",
            get(handlers::service_requests::get_request)
                .patch(handlers::service_requests::update_request)
                .delete(handlers::service_requests::delete_request),
        )
        // Subscriptions
        .route(
            "/api/subscription-plans",
            get(handlers::plans::list_plans).post(handlers::plans::create_plan),
        )
        .route(
            "/api/subscription-plans/:subscription_id",
            get(handlers::plans::get_plan)
                .patch(handlers::plans::update_plan)
                .delete(handlers::plans::delete_plan),
        )
        .route(
            "/api/subscriptions/me",
            get(handlers::subscriptions::get_my_subscription)
                .post(handlers::subscriptions::subscribe)
                .delete(handlers::subscriptions::unsubscribe),
        )
        .route(
            "/api/subscriptions/me/history",
            get(handlers::subscriptions::my_history),
        )
        .route(
            "/api/subscriptions/me/usage",
            get(handlers::subscriptions::my_usage),
        )
        // Admin
        .route("/api/admin/users", get(handlers::admin::list_users))
        .route("/api/admin/users/:user_id", delete(handlers::admin::delete_user))
        .route(
            "/api/admin/users/:user_id/subscription",
            get(handlers::admin::user_subscription),
        )
        .route(
            "/api/admin/subscription-plans",
            get(handlers::admin::plans_with_subscribers),
        )
        .route(
            "/api/admin/subscriptions",
            get(handlers::admin::all_subscriptions),
        )
        .route(
            "/api/admin/properties/count",
            get(handlers::admin::property_counts),
        )
        .route("/api/admin/tenants", get(handlers::admin::tenants_by_owner))
        .route("/api/admin/stats", get(handlers::admin::usage_stats))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let allowed_origins = state.config.security.allowed_origins.clone();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .merge(auth_routes)
        .merge(protected)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors_layer(&allowed_origins))
}
