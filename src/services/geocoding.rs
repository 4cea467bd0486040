// src/services/geocoding.rs
// DOCUMENTATION: Address resolution adapters
// PURPOSE: Turn a street address into coordinates, exactly once per create

use crate::errors::PlacesError;
use crate::models::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

/// Address -> coordinates port consumed by the create operation.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, address: &str) -> Result<Coordinates, PlacesError>;
}

/// Google Geocoding API client
/// DOCUMENTATION: Handles authentication and API calls to the geocoding endpoint
pub struct GoogleGeocoder {
    /// HTTP client for making requests
    client: Client,
    /// Google API key
    api_key: String,
    /// Base URL for the geocoding API
    base_url: String,
}

/// Response from the Google Geocoding API
#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: GeocodeLocation,
}

#[derive(Debug, Deserialize)]
struct GeocodeLocation {
    lat: f64,
    lng: f64,
}

impl GoogleGeocoder {
    pub fn new(api_key: String) -> Self {
        GoogleGeocoder {
            client: Client::new(),
            api_key,
            base_url: "https://maps.googleapis.com/maps/api/geocode/json".to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinates, PlacesError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                log::error!("Geocoding request failed: {}", e);
                PlacesError::GeocodingFailure(e.to_string())
            })?;

        let body: GeocodeResponse = response.json().await.map_err(|e| {
            log::error!("Geocoding response was not parseable: {}", e);
            PlacesError::GeocodingFailure(e.to_string())
        })?;

        if body.status != "OK" {
            log::warn!(
                "Geocoding returned status {} for address '{}'",
                body.status,
                address
            );
            return Err(PlacesError::GeocodingFailure(
                body.error_message.unwrap_or(body.status),
            ));
        }

        let location = body
            .results
            .first()
            .map(|r| &r.geometry.location)
            .ok_or_else(|| PlacesError::GeocodingFailure(format!("no results for '{}'", address)))?;

        Ok(Coordinates { lat: location.lat, lng: location.lng })
    }
}

/// Deterministic resolver backed by a fixed address table.
/// Used by the tests and by keyless local runs, where hitting the real API is
/// not an option; unknown addresses fail the same way the provider would.
pub struct FixedGeocoder {
    entries: HashMap<String, Coordinates>,
}

impl FixedGeocoder {
    pub fn new(entries: impl IntoIterator<Item = (String, Coordinates)>) -> Self {
        FixedGeocoder { entries: entries.into_iter().collect() }
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn resolve(&self, address: &str) -> Result<Coordinates, PlacesError> {
        self.entries
            .get(address)
            .copied()
            .ok_or_else(|| PlacesError::GeocodingFailure(format!("no results for '{}'", address)))
    }
}
