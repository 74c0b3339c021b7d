//! Location search handlers.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geofind_core::ResolutionSource;

use super::LocationView;
use crate::auth::{MaybeUser, SessionKey};
use crate::services::{GeocodeResolver, SelectionOrigin};
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    pub location: LocationView,
    pub source: ResolutionSource,
    pub location_detail_id: Option<Uuid>,
    /// Whether a geocoder result was fully written to the store.
    pub persisted: bool,
    /// Sequence this request was issued for the session's selection.
    pub sequence: u64,
    /// False when a newer request superseded this one before it finished.
    pub selected: bool,
}

/// Resolve a free-text query and select the result.
///
/// # Returns
/// - 200 OK with the resolution
/// - 400 Bad Request for a blank query
/// - 404 Not Found when the geocoder has no candidate
/// - 502 Bad Gateway when the geocoder fails
pub async fn resolve_location(
    State(state): State<AppState>,
    user: MaybeUser,
    SessionKey(session): SessionKey,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<ResolveResponse>, ApiError> {
    // A rejected query must not supersede a search already in flight.
    let query = GeocodeResolver::validate_query(&req.query)?;
    let selection = state.selections.session(&session);
    let ticket = selection.begin();

    let resolution = state.resolver.resolve(query, user.user()).await?;
    let selected = selection.apply(
        ticket,
        resolution.location.clone(),
        SelectionOrigin::Search,
    )?;

    Ok(Json(ResolveResponse {
        location: resolution.location.into(),
        source: resolution.source,
        location_detail_id: resolution.location_detail_id,
        persisted: resolution.persisted,
        sequence: ticket.sequence(),
        selected,
    }))
}
