//! Shared application state.

use std::sync::Arc;

use geofind_core::{Geocoder, LocationStores};

use crate::services::{GeocodeResolver, LocationRecorder, SelectionHub};

#[derive(Clone)]
pub struct AppState {
    pub resolver: GeocodeResolver,
    pub recorder: LocationRecorder,
    pub selections: SelectionHub,
    /// Backend name reported by `/health`.
    pub store_backend: &'static str,
}

impl AppState {
    pub fn new(
        stores: LocationStores,
        geocoder: Arc<dyn Geocoder>,
        history_retention: i64,
        store_backend: &'static str,
    ) -> Self {
        let recorder = LocationRecorder::with_retention(stores.clone(), history_retention);
        Self {
            resolver: GeocodeResolver::new(stores, geocoder, recorder.clone()),
            recorder,
            selections: SelectionHub::new(),
            store_backend,
        }
    }
}
