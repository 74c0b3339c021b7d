//! Selection state handlers.
//!
//! The map and detail views read the current selection and follow changes
//! over Server-Sent Events. Picking a favorite or history entry, or clicking
//! the map, replaces the selection directly.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use geofind_core::{ResolvedLocation, Result as CoreResult};

use super::LocationView;
use crate::auth::SessionKey;
use crate::services::{SelectionChange, SelectionOrigin};
use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct SelectionView {
    pub sequence: u64,
    pub origin: SelectionOrigin,
    pub location: LocationView,
}

impl From<SelectionChange> for SelectionView {
    fn from(change: SelectionChange) -> Self {
        Self {
            sequence: change.sequence,
            origin: change.origin,
            location: change.location.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentSelectionResponse {
    pub issued: u64,
    pub selection: Option<SelectionView>,
}

/// Current selection of the caller's session. Unknown sessions read as empty.
pub async fn get_selection(
    State(state): State<AppState>,
    SessionKey(session): SessionKey,
) -> Json<CurrentSelectionResponse> {
    let snapshot = state
        .selections
        .get(&session)
        .map(|selection| selection.snapshot())
        .unwrap_or_default();
    Json(CurrentSelectionResponse {
        issued: snapshot.issued,
        selection: snapshot.current.map(SelectionView::from),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickSource {
    Favorite,
    History,
}

#[derive(Debug, Deserialize)]
pub struct SelectLocationRequest {
    pub location: ResolvedLocation,
    pub source: Option<PickSource>,
}

/// Select a location picked from the favorites or history list.
pub async fn put_selection(
    State(state): State<AppState>,
    SessionKey(session): SessionKey,
    Json(req): Json<SelectLocationRequest>,
) -> Result<Json<SelectionView>, ApiError> {
    let origin = match req.source {
        Some(PickSource::History) => SelectionOrigin::History,
        Some(PickSource::Favorite) | None => SelectionOrigin::Favorite,
    };
    let change = state
        .selections
        .session(&session)
        .select(req.location, origin)?;
    Ok(Json(change.into()))
}

#[derive(Debug, Deserialize)]
pub struct MapClickRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// Select the point clicked on the map. No reverse geocoding is done.
pub async fn map_click(
    State(state): State<AppState>,
    SessionKey(session): SessionKey,
    Json(req): Json<MapClickRequest>,
) -> Result<Json<SelectionView>, ApiError> {
    let location = ResolvedLocation::from_coordinates(req.latitude, req.longitude)?;
    let change = state
        .selections
        .session(&session)
        .select(location, SelectionOrigin::MapClick)?;
    Ok(Json(change.into()))
}

fn selection_event(change: SelectionChange) -> CoreResult<Event> {
    let json = serde_json::to_string(&SelectionView::from(change))?;
    Ok(Event::default().event("selection").data(json))
}

/// SSE stream of selection changes for the caller's session.
///
/// Subscribing registers the session so later changes reach the stream; it
/// stays registered while the stream is open.
pub async fn selection_events(
    State(state): State<AppState>,
    SessionKey(session): SessionKey,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.selections.session(&session).subscribe();

    use tokio_stream::StreamExt as _;
    let stream = tokio_stream::wrappers::BroadcastStream::new(rx).filter_map(|result| {
        match result {
            Ok(change) => selection_event(change).ok().map(Ok),
            Err(_) => None, // Skip lagged/closed errors
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    )
}
