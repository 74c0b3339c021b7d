//! Nominatim (OpenStreetMap) forward geocoder.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use geofind_core::{defaults, validate_coordinates, Error, GeocodeCandidate, Geocoder, Result};

use crate::config::GeocoderConfig;

/// Raw search result. Nominatim returns coordinates as decimal strings.
#[derive(Debug, Deserialize)]
struct SearchResult {
    lat: String,
    lon: String,
    display_name: String,
    #[serde(rename = "type", default)]
    place_type: Option<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    address: Option<AddressParts>,
}

#[derive(Debug, Default, Deserialize)]
struct AddressParts {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    state: Option<String>,
    country: Option<String>,
    postcode: Option<String>,
}

impl SearchResult {
    fn into_candidate(self) -> Result<GeocodeCandidate> {
        let latitude: f64 = self
            .lat
            .trim()
            .parse()
            .map_err(|_| Error::Geocoding(format!("Malformed latitude: {:?}", self.lat)))?;
        let longitude: f64 = self
            .lon
            .trim()
            .parse()
            .map_err(|_| Error::Geocoding(format!("Malformed longitude: {:?}", self.lon)))?;
        validate_coordinates(latitude, longitude)
            .map_err(|e| Error::Geocoding(format!("Provider returned {e}")))?;

        let address = self.address.unwrap_or_default();
        Ok(GeocodeCandidate {
            latitude,
            longitude,
            display_name: self.display_name,
            place_type: self.place_type,
            importance: self.importance,
            country: address.country,
            state: address.state,
            city: address.city.or(address.town).or(address.village),
            postal_code: address.postcode,
        })
    }
}

/// Geocoder backed by a Nominatim-compatible `/search` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    config: GeocoderConfig,
}

impl NominatimGeocoder {
    /// Create a geocoder from validated configuration.
    pub fn new(config: GeocoderConfig) -> Result<Self> {
        config.validate()?;
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        info!(
            subsystem = "geocode",
            component = "nominatim",
            url = %config.base_url,
            timeout_secs = config.timeout_secs,
            "Initializing Nominatim geocoder"
        );
        Ok(Self { client, config })
    }

    /// Create from `GEOCODER_CONFIG` or `GEOCODER_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GeocoderConfig::load()?)
    }

    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeCandidate>> {
        let start = Instant::now();
        let limit = defaults::GEOCODER_RESULT_LIMIT.to_string();

        let response = self
            .client
            .get(self.config.search_url())
            .query(&[
                ("q", query),
                ("format", "json"),
                ("limit", limit.as_str()),
                ("addressdetails", "1"),
            ])
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "geocode",
                component = "nominatim",
                status = status.as_u16(),
                "Geocoder returned non-success status"
            );
            return Err(Error::Geocoding(format!(
                "Geocoder returned {}: {}",
                status, body
            )));
        }

        let results: Vec<SearchResult> = response
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to parse response: {e}")))?;

        let result_count = results.len();
        let candidate = match results.into_iter().next() {
            Some(first) => Some(first.into_candidate()?),
            None => None,
        };

        debug!(
            subsystem = "geocode",
            component = "nominatim",
            op = "geocode",
            result_count,
            duration_ms = start.elapsed().as_millis() as u64,
            "Geocode complete"
        );
        Ok(candidate)
    }

    fn provider_name(&self) -> &str {
        "nominatim"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lat: &str, lon: &str) -> SearchResult {
        SearchResult {
            lat: lat.to_string(),
            lon: lon.to_string(),
            display_name: "Somewhere".to_string(),
            place_type: None,
            importance: None,
            address: None,
        }
    }

    #[test]
    fn test_city_falls_back_to_town_then_village() {
        let mut r = raw("1.0", "2.0");
        r.address = Some(AddressParts {
            village: Some("Littleton".to_string()),
            ..Default::default()
        });
        assert_eq!(r.into_candidate().unwrap().city.as_deref(), Some("Littleton"));

        let mut r = raw("1.0", "2.0");
        r.address = Some(AddressParts {
            town: Some("Midtown".to_string()),
            village: Some("Littleton".to_string()),
            ..Default::default()
        });
        assert_eq!(r.into_candidate().unwrap().city.as_deref(), Some("Midtown"));
    }

    #[test]
    fn test_malformed_latitude_is_geocoding_error() {
        let err = raw("north", "2.0").into_candidate().unwrap_err();
        assert!(matches!(err, Error::Geocoding(_)));
    }

    #[test]
    fn test_out_of_range_is_geocoding_error() {
        let err = raw("95.0", "2.0").into_candidate().unwrap_err();
        assert!(matches!(err, Error::Geocoding(_)));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = GeocoderConfig {
            base_url: "not-a-url".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            NominatimGeocoder::new(config),
            Err(Error::Config(_))
        ));
    }
}
