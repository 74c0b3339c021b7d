//! Favorite handlers. All of them except the status check require a
//! signed-in user.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geofind_core::{FavoriteToggle, FavoriteWithLocation, ResolvedLocation};

use super::LocationView;
use crate::auth::MaybeUser;
use crate::services::FavoriteLabels;
use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct FavoriteView {
    pub id: Uuid,
    pub location_detail_id: Uuid,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `None` when the location has no coordinate and cannot be selected.
    pub location: Option<LocationView>,
}

impl From<FavoriteWithLocation> for FavoriteView {
    fn from(row: FavoriteWithLocation) -> Self {
        let location = row.to_resolved().map(LocationView::from);
        Self {
            id: row.favorite.id,
            location_detail_id: row.favorite.location_detail_id,
            name: row.favorite.name,
            notes: row.favorite.notes,
            created_at: row.favorite.created_at,
            location,
        }
    }
}

/// List the caller's favorites, newest first.
pub async fn list_favorites(
    State(state): State<AppState>,
    user: MaybeUser,
) -> Result<Json<Vec<FavoriteView>>, ApiError> {
    let rows = state.recorder.list_favorites(user.user()).await?;
    Ok(Json(rows.into_iter().map(FavoriteView::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub location: ResolvedLocation,
    pub name: Option<String>,
    pub notes: Option<String>,
}

/// Favorite a location, or unfavorite it when already saved.
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: MaybeUser,
    Json(req): Json<ToggleFavoriteRequest>,
) -> Result<Json<FavoriteToggle>, ApiError> {
    let labels = FavoriteLabels {
        name: req.name,
        notes: req.notes,
    };
    let toggle = state
        .recorder
        .toggle_favorite(&req.location, user.user(), labels)
        .await?;
    Ok(Json(toggle))
}

#[derive(Debug, Deserialize)]
pub struct FavoriteStatusQuery {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct FavoriteStatus {
    pub favorited: bool,
}

/// Whether the caller has favorited the location with this address.
pub async fn favorite_status(
    State(state): State<AppState>,
    user: MaybeUser,
    Query(query): Query<FavoriteStatusQuery>,
) -> Result<Json<FavoriteStatus>, ApiError> {
    let favorited = state
        .recorder
        .is_favorited(&query.address, user.user())
        .await?;
    Ok(Json(FavoriteStatus { favorited }))
}

/// Delete one of the caller's favorites.
pub async fn delete_favorite(
    State(state): State<AppState>,
    user: MaybeUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.recorder.remove_favorite(id, user.user()).await?;
    Ok(StatusCode::NO_CONTENT)
}
