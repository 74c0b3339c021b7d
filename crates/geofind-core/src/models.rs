//! Core data models for geofind.
//!
//! These types are shared across all geofind crates: persisted records
//! (location details, coordinates, favorites, search history), their insert
//! requests, and the transient shapes passed between the resolver, the
//! selection state, and the HTTP layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::{format_coordinate_pair, validate_coordinates};
use crate::defaults::{COORDINATE_DISPLAY_PRECISION, EXTERNAL_MAP_URL};
use crate::error::Result;

// =============================================================================
// LOCATION TYPES
// =============================================================================

/// Identity record for a place.
///
/// Several rows may describe the same logical place; nothing in the schema
/// enforces uniqueness on `address_key`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDetail {
    pub id: Uuid,
    /// Free-form address text (the query that produced the record, or a
    /// coordinate pair for map picks).
    pub address: String,
    /// Canonical matching key derived from `address`.
    pub address_key: String,
    pub formatted_address: Option<String>,
    pub display_name: Option<String>,
    pub place_type: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    /// Owning user; `None` for anonymous lookups.
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A coordinate belonging to a [`LocationDetail`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCoordinate {
    pub id: Uuid,
    pub location_detail_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    /// Provider relevance score when the coordinate came from geocoding.
    pub accuracy: Option<f64>,
    pub elevation: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// A location detail joined with its coordinates (oldest first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWithCoordinates {
    #[serde(flatten)]
    pub detail: LocationDetail,
    pub coordinates: Vec<LocationCoordinate>,
}

impl LocationWithCoordinates {
    /// The coordinate the application treats as authoritative (index 0).
    pub fn primary_coordinate(&self) -> Option<&LocationCoordinate> {
        self.coordinates.first()
    }

    /// Convert into the transient shape used by the views.
    ///
    /// Returns `None` when the detail has no coordinate yet.
    pub fn to_resolved(&self) -> Option<ResolvedLocation> {
        let coord = self.primary_coordinate()?;
        let formatted = self
            .detail
            .formatted_address
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.detail.display_name.clone().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| self.detail.address.clone());
        Some(ResolvedLocation {
            latitude: coord.latitude,
            longitude: coord.longitude,
            address: self.detail.address.clone(),
            formatted_address: formatted,
        })
    }
}

/// Request for creating a location detail.
#[derive(Debug, Clone, Default)]
pub struct NewLocationDetail {
    pub user_id: Option<Uuid>,
    pub address: String,
    pub formatted_address: Option<String>,
    pub display_name: Option<String>,
    pub place_type: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl NewLocationDetail {
    /// Detail built from a geocoding candidate for the given query.
    pub fn from_candidate(
        query: &str,
        candidate: &GeocodeCandidate,
        user_id: Option<Uuid>,
    ) -> Self {
        Self {
            user_id,
            address: query.to_string(),
            formatted_address: Some(candidate.display_name.clone()),
            display_name: Some(candidate.display_name.clone()),
            place_type: candidate.place_type.clone(),
            country: candidate.country.clone(),
            state: candidate.state.clone(),
            city: candidate.city.clone(),
            postal_code: candidate.postal_code.clone(),
        }
    }

    /// Detail built from an already-resolved location (favorites of map picks).
    pub fn from_resolved(location: &ResolvedLocation, user_id: Option<Uuid>) -> Self {
        Self {
            user_id,
            address: location.address.clone(),
            formatted_address: Some(location.formatted_address.clone()),
            ..Default::default()
        }
    }
}

/// Request for creating a coordinate.
#[derive(Debug, Clone)]
pub struct NewLocationCoordinate {
    pub location_detail_id: Uuid,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
    pub elevation: Option<f64>,
}

// =============================================================================
// FAVORITE TYPES
// =============================================================================

/// A user's saved location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_detail_id: Uuid,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request for creating a favorite.
#[derive(Debug, Clone)]
pub struct NewFavorite {
    pub user_id: Uuid,
    pub location_detail_id: Uuid,
    pub name: Option<String>,
    pub notes: Option<String>,
}

/// Favorite joined with its location (None if the detail was removed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteWithLocation {
    #[serde(flatten)]
    pub favorite: Favorite,
    pub location: Option<LocationWithCoordinates>,
}

impl FavoriteWithLocation {
    /// Selectable location for this favorite, if it has a coordinate.
    pub fn to_resolved(&self) -> Option<ResolvedLocation> {
        self.location.as_ref().and_then(|l| l.to_resolved())
    }
}

/// Outcome of a favorite toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteToggle {
    /// State after the toggle.
    pub favorited: bool,
    /// Favorite row created (`favorited`) or removed (not `favorited`).
    pub favorite_id: Uuid,
}

// =============================================================================
// SEARCH HISTORY TYPES
// =============================================================================

/// One search performed by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub location_detail_id: Option<Uuid>,
    pub search_query: String,
    pub searched_at: DateTime<Utc>,
}

/// Request for appending a history entry.
#[derive(Debug, Clone)]
pub struct NewSearchHistoryEntry {
    pub user_id: Uuid,
    pub location_detail_id: Option<Uuid>,
    pub search_query: String,
}

/// History entry joined with its location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryWithLocation {
    #[serde(flatten)]
    pub entry: SearchHistoryEntry,
    pub location: Option<LocationWithCoordinates>,
}

impl HistoryWithLocation {
    /// Selectable location for this entry, if it has a coordinate.
    pub fn to_resolved(&self) -> Option<ResolvedLocation> {
        self.location.as_ref().and_then(|l| l.to_resolved())
    }
}

// =============================================================================
// RESOLUTION TYPES
// =============================================================================

/// The transient location shape shared by the resolver, the selection
/// state, and the map/detail views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub formatted_address: String,
}

impl ResolvedLocation {
    /// Location synthesized from a point picked on the map. No reverse
    /// geocoding: both address fields carry the coordinate pair.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Result<Self> {
        validate_coordinates(latitude, longitude)?;
        let pair = format_coordinate_pair(latitude, longitude);
        Ok(Self {
            latitude,
            longitude,
            address: pair.clone(),
            formatted_address: pair,
        })
    }

    /// Check coordinate ranges.
    pub fn validate(&self) -> Result<()> {
        validate_coordinates(self.latitude, self.longitude)
    }

    /// `"lat, lon"` with display precision.
    pub fn coordinate_pair(&self) -> String {
        format_coordinate_pair(self.latitude, self.longitude)
    }

    /// Link that opens the location in an external map.
    pub fn maps_url(&self) -> String {
        format!("{}{},{}", EXTERNAL_MAP_URL, self.latitude, self.longitude)
    }

    /// Multi-line summary suitable for copying to the clipboard.
    pub fn details_text(&self) -> String {
        format!(
            "{}\nLatitude: {:.prec$}\nLongitude: {:.prec$}",
            self.address,
            self.latitude,
            self.longitude,
            prec = COORDINATE_DISPLAY_PRECISION
        )
    }
}

/// Where a resolution was served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSource {
    /// A stored location detail matched the query.
    Cache,
    /// The external geocoding provider was called.
    Geocoder,
}

impl ResolutionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSource::Cache => "cache",
            ResolutionSource::Geocoder => "geocoder",
        }
    }
}

/// Successful output of the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub location: ResolvedLocation,
    pub source: ResolutionSource,
    /// Stored detail backing the result; `None` if the cache write failed.
    pub location_detail_id: Option<Uuid>,
    /// False when a geocoded result could not be written back.
    pub persisted: bool,
}

/// One candidate returned by a geocoding provider, already parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
    pub place_type: Option<String>,
    /// Provider relevance score.
    pub importance: Option<f64>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

impl GeocodeCandidate {
    /// Minimal candidate with only coordinates and a display name.
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            display_name: display_name.into(),
            place_type: None,
            importance: None,
            country: None,
            state: None,
            city: None,
            postal_code: None,
        }
    }
}

// =============================================================================
// AUTH BOUNDARY
// =============================================================================

/// The authenticated caller, as asserted by the external auth provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
}

impl CurrentUser {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}
