//! Geocode resolution with a store-first cache.
//!
//! A query is answered from a stored location detail when one matches,
//! otherwise from the external geocoder. Fresh results are written back so
//! the next lookup for the same place stays local.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};
use uuid::Uuid;

use geofind_core::{
    CurrentUser, Error, GeocodeCandidate, Geocoder, LocationStores, LocationWithCoordinates,
    NewLocationCoordinate, NewLocationDetail, Resolution, ResolutionSource, ResolvedLocation,
    Result,
};

use super::recorder::LocationRecorder;

#[derive(Clone)]
pub struct GeocodeResolver {
    stores: LocationStores,
    geocoder: Arc<dyn Geocoder>,
    recorder: LocationRecorder,
}

impl GeocodeResolver {
    pub fn new(
        stores: LocationStores,
        geocoder: Arc<dyn Geocoder>,
        recorder: LocationRecorder,
    ) -> Self {
        Self {
            stores,
            geocoder,
            recorder,
        }
    }

    /// The trimmed query, or `Validation` when nothing is left.
    pub fn validate_query(query: &str) -> Result<&str> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::Validation("Search query cannot be empty".to_string()));
        }
        Ok(query)
    }

    /// Resolve a free-text query to a location.
    ///
    /// Errors: `Validation` for blank queries, `LocationNotFound` when the
    /// provider has no candidate, `Geocoding` when the provider fails.
    pub async fn resolve(&self, query: &str, user: Option<&CurrentUser>) -> Result<Resolution> {
        let query = Self::validate_query(query)?;
        let start = Instant::now();

        if let Some(cached) = self.lookup_cached(query).await {
            if let Some(location) = cached.to_resolved() {
                if let Some(user) = user {
                    self.recorder
                        .record_search(user, Some(cached.detail.id), query)
                        .await;
                }
                info!(
                    subsystem = "api",
                    component = "resolver",
                    op = "resolve",
                    source = ResolutionSource::Cache.as_str(),
                    location_id = %cached.detail.id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Resolved from cache"
                );
                return Ok(Resolution {
                    location,
                    source: ResolutionSource::Cache,
                    location_detail_id: Some(cached.detail.id),
                    persisted: true,
                });
            }
        }

        let candidate = self
            .geocoder
            .geocode(query)
            .await?
            .ok_or_else(|| Error::LocationNotFound(query.to_string()))?;

        let location = ResolvedLocation {
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            address: query.to_string(),
            formatted_address: candidate.display_name.clone(),
        };

        let (location_detail_id, persisted) = self
            .persist(query, &candidate, user.map(|u| u.id))
            .await;

        if let (Some(user), Some(detail_id)) = (user, location_detail_id) {
            self.recorder.record_search(user, Some(detail_id), query).await;
        }

        info!(
            subsystem = "api",
            component = "resolver",
            op = "resolve",
            source = ResolutionSource::Geocoder.as_str(),
            provider = self.geocoder.provider_name(),
            persisted,
            duration_ms = start.elapsed().as_millis() as u64,
            "Resolved from geocoder"
        );
        Ok(Resolution {
            location,
            source: ResolutionSource::Geocoder,
            location_detail_id,
            persisted,
        })
    }

    /// First stored detail matching the query. Lookup failures count as a
    /// miss.
    async fn lookup_cached(&self, query: &str) -> Option<LocationWithCoordinates> {
        match self.stores.locations.search_by_address(query, 1).await {
            Ok(mut hits) => {
                debug!(
                    subsystem = "api",
                    component = "resolver",
                    result_count = hits.len(),
                    "Cache lookup"
                );
                if hits.is_empty() {
                    None
                } else {
                    Some(hits.swap_remove(0))
                }
            }
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "resolver",
                    op = "cache_lookup",
                    error = %e,
                    "Cache lookup failed, falling through to geocoder"
                );
                None
            }
        }
    }

    /// Write a geocoder result back to the store.
    ///
    /// Returns the new detail id (if the detail row was written) and whether
    /// both the detail and its coordinate were written.
    async fn persist(
        &self,
        query: &str,
        candidate: &GeocodeCandidate,
        user_id: Option<Uuid>,
    ) -> (Option<Uuid>, bool) {
        let detail = match self
            .stores
            .locations
            .insert_location(NewLocationDetail::from_candidate(query, candidate, user_id))
            .await
        {
            Ok(detail) => detail,
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "resolver",
                    op = "persist",
                    db_table = "location_details",
                    error = %e,
                    "Failed to cache geocoding result"
                );
                return (None, false);
            }
        };

        let coordinate = NewLocationCoordinate {
            location_detail_id: detail.id,
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            accuracy: candidate.importance,
            elevation: None,
        };
        match self.stores.locations.insert_coordinate(coordinate).await {
            Ok(_) => (Some(detail.id), true),
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "resolver",
                    op = "persist",
                    db_table = "location_coordinates",
                    location_id = %detail.id,
                    error = %e,
                    "Failed to cache geocoding coordinate"
                );
                (Some(detail.id), false)
            }
        }
    }
}
