//! Favorite and search history recording.

use tracing::{debug, info, warn};
use uuid::Uuid;

use geofind_core::{
    defaults, CurrentUser, Error, FavoriteToggle, FavoriteWithLocation, HistoryWithLocation,
    LocationStores, NewFavorite, NewLocationCoordinate, NewLocationDetail,
    NewSearchHistoryEntry, ResolvedLocation, Result,
};

/// Optional labels attached to a new favorite.
#[derive(Debug, Clone, Default)]
pub struct FavoriteLabels {
    pub name: Option<String>,
    pub notes: Option<String>,
}

fn require_user<'a>(user: Option<&'a CurrentUser>, action: &str) -> Result<&'a CurrentUser> {
    user.ok_or_else(|| Error::AuthRequired(format!("Sign in to {action}")))
}

/// Links resolved locations to a user's favorites and search history.
#[derive(Clone)]
pub struct LocationRecorder {
    stores: LocationStores,
    history_retention: i64,
}

impl LocationRecorder {
    pub fn new(stores: LocationStores) -> Self {
        Self::with_retention(stores, defaults::HISTORY_RETENTION)
    }

    pub fn with_retention(stores: LocationStores, history_retention: i64) -> Self {
        Self {
            stores,
            history_retention: history_retention.max(1),
        }
    }

    /// Favorite `location`, or unfavorite it if the user already has it.
    ///
    /// Anonymous callers get `AuthRequired` before any store access.
    pub async fn toggle_favorite(
        &self,
        location: &ResolvedLocation,
        user: Option<&CurrentUser>,
        labels: FavoriteLabels,
    ) -> Result<FavoriteToggle> {
        let user = require_user(user, "save favorites")?;
        location.validate()?;
        if location.address.trim().is_empty() {
            return Err(Error::Validation("Location address cannot be empty".to_string()));
        }

        let existing = self
            .stores
            .locations
            .find_by_address(&location.address)
            .await?;

        if let Some(found) = &existing {
            if let Some(favorite) = self
                .stores
                .favorites
                .find_favorite(user.id, found.detail.id)
                .await?
            {
                self.stores.favorites.delete_favorite(favorite.id).await?;
                info!(
                    subsystem = "api",
                    component = "recorder",
                    op = "unfavorite",
                    user_id = %user.id,
                    favorite_id = %favorite.id,
                    "Favorite removed"
                );
                return Ok(FavoriteToggle {
                    favorited: false,
                    favorite_id: favorite.id,
                });
            }
        }

        let location_detail_id = match existing {
            Some(found) => {
                if found.coordinates.is_empty() {
                    self.insert_coordinate(found.detail.id, location).await?;
                }
                found.detail.id
            }
            None => {
                let detail = self
                    .stores
                    .locations
                    .insert_location(NewLocationDetail::from_resolved(location, Some(user.id)))
                    .await?;
                self.insert_coordinate(detail.id, location).await?;
                detail.id
            }
        };

        let favorite = self
            .stores
            .favorites
            .insert_favorite(NewFavorite {
                user_id: user.id,
                location_detail_id,
                name: labels.name,
                notes: labels.notes,
            })
            .await?;

        info!(
            subsystem = "api",
            component = "recorder",
            op = "favorite",
            user_id = %user.id,
            favorite_id = %favorite.id,
            location_id = %location_detail_id,
            "Favorite added"
        );
        Ok(FavoriteToggle {
            favorited: true,
            favorite_id: favorite.id,
        })
    }

    async fn insert_coordinate(
        &self,
        location_detail_id: Uuid,
        location: &ResolvedLocation,
    ) -> Result<()> {
        self.stores
            .locations
            .insert_coordinate(NewLocationCoordinate {
                location_detail_id,
                latitude: location.latitude,
                longitude: location.longitude,
                accuracy: None,
                elevation: None,
            })
            .await?;
        Ok(())
    }

    /// Whether `location` is among the user's favorites. Anonymous users
    /// have none.
    pub async fn is_favorited(
        &self,
        address: &str,
        user: Option<&CurrentUser>,
    ) -> Result<bool> {
        let Some(user) = user else {
            return Ok(false);
        };
        let Some(found) = self.stores.locations.find_by_address(address).await? else {
            return Ok(false);
        };
        Ok(self
            .stores
            .favorites
            .find_favorite(user.id, found.detail.id)
            .await?
            .is_some())
    }

    /// Delete one of the caller's favorites by id.
    ///
    /// Favorites owned by someone else are reported as not found.
    pub async fn remove_favorite(
        &self,
        favorite_id: Uuid,
        user: Option<&CurrentUser>,
    ) -> Result<()> {
        let user = require_user(user, "manage favorites")?;
        match self.stores.favorites.get_favorite(favorite_id).await? {
            Some(favorite) if favorite.user_id == user.id => {
                self.stores.favorites.delete_favorite(favorite_id).await?;
                Ok(())
            }
            _ => Err(Error::FavoriteNotFound(favorite_id)),
        }
    }

    /// The caller's favorites, newest first.
    pub async fn list_favorites(
        &self,
        user: Option<&CurrentUser>,
    ) -> Result<Vec<FavoriteWithLocation>> {
        let user = require_user(user, "view favorites")?;
        self.stores.favorites.list_favorites(user.id).await
    }

    /// The caller's most recent searches, newest first, at most 20.
    pub async fn list_history(
        &self,
        user: Option<&CurrentUser>,
        limit: Option<i64>,
    ) -> Result<Vec<HistoryWithLocation>> {
        let user = require_user(user, "view search history")?;
        let limit = limit.unwrap_or(defaults::HISTORY_PAGE_LIMIT);
        self.stores.history.list_history(user.id, limit).await
    }

    /// Append a history entry and prune past the retention bound.
    ///
    /// Failures are logged and reported as `false`.
    pub async fn record_search(
        &self,
        user: &CurrentUser,
        location_detail_id: Option<Uuid>,
        query: &str,
    ) -> bool {
        let entry = NewSearchHistoryEntry {
            user_id: user.id,
            location_detail_id,
            search_query: query.to_string(),
        };
        if let Err(e) = self.stores.history.insert_history(entry).await {
            warn!(
                subsystem = "api",
                component = "recorder",
                op = "record_search",
                user_id = %user.id,
                error = %e,
                "Failed to record search history"
            );
            return false;
        }

        match self
            .stores
            .history
            .prune_history(user.id, self.history_retention)
            .await
        {
            Ok(0) => {}
            Ok(pruned) => debug!(
                subsystem = "api",
                component = "recorder",
                user_id = %user.id,
                pruned,
                "Pruned search history"
            ),
            Err(e) => warn!(
                subsystem = "api",
                component = "recorder",
                op = "prune_history",
                user_id = %user.id,
                error = %e,
                "Failed to prune search history"
            ),
        }
        true
    }
}
