//! Core traits for geofind abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends (PostgreSQL, in-memory,
//! Nominatim, mocks) and testability.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// LOCATION REPOSITORY TRAITS
// =============================================================================

/// Repository for location details and their coordinates.
#[async_trait]
pub trait LocationRepository: Send + Sync {
    /// Insert a location detail. The address key is derived by the store.
    async fn insert_location(&self, req: NewLocationDetail) -> Result<LocationDetail>;

    /// Insert a coordinate for an existing detail.
    async fn insert_coordinate(&self, req: NewLocationCoordinate) -> Result<LocationCoordinate>;

    /// Fetch a detail with its coordinates by ID.
    async fn fetch_location(&self, id: Uuid) -> Result<Option<LocationWithCoordinates>>;

    /// Find a detail whose address key equals the key of `address`.
    ///
    /// When several rows share the key, the oldest wins.
    async fn find_by_address(&self, address: &str) -> Result<Option<LocationWithCoordinates>>;

    /// Details whose address contains `fragment` (case-insensitive) and that
    /// have at least one coordinate.
    ///
    /// Ordered: exact key match first, then oldest `created_at`, then id.
    async fn search_by_address(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<LocationWithCoordinates>>;

    /// Delete a detail and its coordinates. Returns false if it did not exist.
    async fn delete_location(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// FAVORITE REPOSITORY TRAITS
// =============================================================================

/// Repository for user favorites.
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Insert a favorite.
    async fn insert_favorite(&self, req: NewFavorite) -> Result<Favorite>;

    /// Get a favorite by ID.
    async fn get_favorite(&self, id: Uuid) -> Result<Option<Favorite>>;

    /// Find the favorite linking `user_id` to a location detail.
    async fn find_favorite(&self, user_id: Uuid, location_detail_id: Uuid)
        -> Result<Option<Favorite>>;

    /// Delete a favorite. Returns false if it did not exist.
    async fn delete_favorite(&self, id: Uuid) -> Result<bool>;

    /// All favorites of a user with their locations, newest first.
    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteWithLocation>>;
}

// =============================================================================
// SEARCH HISTORY REPOSITORY TRAITS
// =============================================================================

/// Repository for the append-only search history.
#[async_trait]
pub trait SearchHistoryRepository: Send + Sync {
    /// Append an entry.
    async fn insert_history(&self, req: NewSearchHistoryEntry) -> Result<SearchHistoryEntry>;

    /// Most recent entries of a user with their locations, newest first.
    async fn list_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<HistoryWithLocation>>;

    /// Delete all but the `keep` most recent entries of a user.
    /// Returns the number of deleted rows.
    async fn prune_history(&self, user_id: Uuid, keep: i64) -> Result<u64>;
}

/// The three repositories the services need, as injected trait objects.
#[derive(Clone)]
pub struct LocationStores {
    pub locations: Arc<dyn LocationRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub history: Arc<dyn SearchHistoryRepository>,
}

impl LocationStores {
    /// Bundle a single backend that implements all three repositories.
    pub fn from_backend<S>(store: Arc<S>) -> Self
    where
        S: LocationRepository + FavoriteRepository + SearchHistoryRepository + 'static,
    {
        Self {
            locations: store.clone(),
            favorites: store.clone(),
            history: store,
        }
    }
}

// =============================================================================
// GEOCODER TRAITS
// =============================================================================

/// Forward geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Geocode a free-text query.
    ///
    /// `Ok(None)` means the provider answered with zero candidates.
    /// Transport failures, non-2xx statuses, and malformed payloads are
    /// reported as `Error::Geocoding`.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeCandidate>>;

    /// Provider name for logs.
    fn provider_name(&self) -> &str;
}
