//! Mock geocoder for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geofind_geocode::mock::MockGeocoder;
//!
//! let geocoder = MockGeocoder::new()
//!     .with_location("Eiffel Tower", 48.8584, 2.2945, "Tour Eiffel, Paris, France");
//!
//! let hit = geocoder.geocode("eiffel tower").await.unwrap();
//! assert!(hit.is_some());
//! assert_eq!(geocoder.call_count(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use geofind_core::{address_key, Error, GeocodeCandidate, Geocoder, Result};

/// What the mock answers for a query.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Found(GeocodeCandidate),
    Empty,
    Fail(String),
}

#[derive(Debug, Clone)]
struct MockConfig {
    responses: HashMap<String, MockResponse>,
    latencies: HashMap<String, u64>,
    default_response: MockResponse,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            responses: HashMap::new(),
            latencies: HashMap::new(),
            default_response: MockResponse::Empty,
            latency_ms: 0,
        }
    }
}

/// Geocoder returning canned candidates keyed by normalized query.
#[derive(Clone, Default)]
pub struct MockGeocoder {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<String>>>,
}

impl MockGeocoder {
    /// Create a mock that answers "no results" to everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with a candidate at the given position.
    pub fn with_location(
        self,
        query: &str,
        latitude: f64,
        longitude: f64,
        display_name: &str,
    ) -> Self {
        self.with_candidate(query, GeocodeCandidate::new(latitude, longitude, display_name))
    }

    /// Answer `query` with a full candidate.
    pub fn with_candidate(mut self, query: &str, candidate: GeocodeCandidate) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(address_key(query), MockResponse::Found(candidate));
        self
    }

    /// Fail `query` with a geocoding error.
    pub fn with_failure(mut self, query: &str, message: &str) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(address_key(query), MockResponse::Fail(message.to_string()));
        self
    }

    /// Answer for every query without a specific mapping.
    pub fn with_default_response(mut self, response: MockResponse) -> Self {
        Arc::make_mut(&mut self.config).default_response = response;
        self
    }

    /// Delay every answer.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    /// Delay answers for one query, overriding the global latency.
    pub fn with_latency_for(mut self, query: &str, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config)
            .latencies
            .insert(address_key(query), latency_ms);
        self
    }

    /// Number of geocode calls made.
    pub fn call_count(&self) -> usize {
        self.calls().len()
    }

    /// Queries received, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.call_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeCandidate>> {
        self.call_log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(query.to_string());

        let key = address_key(query);
        let latency = self
            .config
            .latencies
            .get(&key)
            .copied()
            .unwrap_or(self.config.latency_ms);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        match self
            .config
            .responses
            .get(&key)
            .unwrap_or(&self.config.default_response)
        {
            MockResponse::Found(candidate) => Ok(Some(candidate.clone())),
            MockResponse::Empty => Ok(None),
            MockResponse::Fail(message) => Err(Error::Geocoding(message.clone())),
        }
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
