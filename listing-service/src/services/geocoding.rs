use crate::config::GeocodingConfig;
use crate::models::Coordinates;
use async_trait::async_trait;
use serde::Deserialize;
use service_core::error::AppError;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub coordinates: Coordinates,
    pub formatted: Option<String>,
}

/// Address to coordinates lookup. Callers treat failures as non-fatal except
/// on the explicit lookup route.
#[async_trait]
pub trait Geocoder: Send + Sync {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, AppError>;
}

/// Client for OpenCage-compatible forward geocoding APIs.
pub struct OpenCageGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct OpenCageResponse {
    #[serde(default)]
    results: Vec<OpenCageResult>,
}

#[derive(Debug, Deserialize)]
struct OpenCageResult {
    geometry: OpenCageGeometry,
    formatted: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenCageGeometry {
    lat: f64,
    lng: f64,
}

impl OpenCageGeocoder {
    pub fn new(config: &GeocodingConfig, api_key: String) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
        })
    }
}

fn first_result(body: OpenCageResponse) -> Option<GeocodeResult> {
    body.results.into_iter().next().map(|r| GeocodeResult {
        coordinates: Coordinates {
            lat: r.geometry.lat,
            lng: r.geometry.lng,
        },
        formatted: r.formatted,
    })
}

#[async_trait]
impl Geocoder for OpenCageGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<GeocodeResult>, AppError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("q", address),
                ("key", self.api_key.as_str()),
                ("limit", "1"),
                ("no_annotations", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::BadGateway(format!("geocoding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::BadGateway(format!(
                "geocoding provider returned {}",
                status
            )));
        }

        let body: OpenCageResponse = response
            .json()
            .await
            .map_err(|e| AppError::BadGateway(format!("invalid geocoding response: {}", e)))?;

        Ok(first_result(body))
    }
}

/// Used when no API key is configured.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn geocode(&self, _address: &str) -> Result<Option<GeocodeResult>, AppError> {
        Ok(None)
    }
}
