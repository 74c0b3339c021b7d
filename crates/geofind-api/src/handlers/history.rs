use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use geofind_core::HistoryWithLocation;

use super::LocationView;
use crate::auth::MaybeUser;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryView {
    pub id: Uuid,
    pub search_query: String,
    pub searched_at: DateTime<Utc>,
    pub location_detail_id: Option<Uuid>,
    pub location: Option<LocationView>,
}

impl From<HistoryWithLocation> for HistoryView {
    fn from(row: HistoryWithLocation) -> Self {
        let location = row.to_resolved().map(LocationView::from);
        Self {
            id: row.entry.id,
            search_query: row.entry.search_query,
            searched_at: row.entry.searched_at,
            location_detail_id: row.entry.location_detail_id,
            location,
        }
    }
}

/// The caller's recent searches, newest first (at most 20).
pub async fn list_history(
    State(state): State<AppState>,
    user: MaybeUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<HistoryView>>, ApiError> {
    let rows = state.recorder.list_history(user.user(), query.limit).await?;
    Ok(Json(rows.into_iter().map(HistoryView::from).collect()))
}
