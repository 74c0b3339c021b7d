//! HTTP handlers for geofind-api.

pub mod favorites;
pub mod health;
pub mod history;
pub mod locations;
pub mod selection;

use serde::Serialize;

use geofind_core::ResolvedLocation;

/// A location as rendered for the map and detail views.
#[derive(Debug, Clone, Serialize)]
pub struct LocationView {
    #[serde(flatten)]
    pub location: ResolvedLocation,
    pub coordinate_pair: String,
    pub maps_url: String,
    pub details_text: String,
}

impl From<ResolvedLocation> for LocationView {
    fn from(location: ResolvedLocation) -> Self {
        Self {
            coordinate_pair: location.coordinate_pair(),
            maps_url: location.maps_url(),
            details_text: location.details_text(),
            location,
        }
    }
}
