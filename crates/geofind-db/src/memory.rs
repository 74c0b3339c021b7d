//! In-memory implementation of the location, favorite, and history
//! repositories.
//!
//! Used by the server when no `DATABASE_URL` is configured and by service
//! tests. Rows carry an insertion sequence so ordering stays deterministic
//! even when two rows share a timestamp.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use geofind_core::{
    address_key, validate_coordinates, Error, Favorite, FavoriteRepository,
    FavoriteWithLocation, HistoryWithLocation, LocationCoordinate, LocationDetail,
    LocationRepository, LocationStores, LocationWithCoordinates, NewFavorite,
    NewLocationCoordinate, NewLocationDetail, NewSearchHistoryEntry, Result, SearchHistoryEntry,
    SearchHistoryRepository,
};

use crate::history::clamp_history_limit;

/// Table targeted by a simulated write failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteTarget {
    Locations,
    Coordinates,
    Favorites,
    History,
}

impl WriteTarget {
    fn table(&self) -> &'static str {
        match self {
            WriteTarget::Locations => "location_details",
            WriteTarget::Coordinates => "location_coordinates",
            WriteTarget::Favorites => "favorites",
            WriteTarget::History => "search_history",
        }
    }
}

struct Stored<T> {
    seq: u64,
    row: T,
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    details: HashMap<Uuid, Stored<LocationDetail>>,
    coordinates: Vec<Stored<LocationCoordinate>>,
    favorites: Vec<Stored<Favorite>>,
    history: Vec<Stored<SearchHistoryEntry>>,
    failing: HashSet<WriteTarget>,
}

impl Inner {
    fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn check_write(&self, target: WriteTarget) -> Result<()> {
        if self.failing.contains(&target) {
            return Err(Error::Internal(format!(
                "simulated write failure on {}",
                target.table()
            )));
        }
        Ok(())
    }

    fn with_coordinates(&self, id: Uuid) -> Option<LocationWithCoordinates> {
        let detail = self.details.get(&id)?;
        let mut coords: Vec<&Stored<LocationCoordinate>> = self
            .coordinates
            .iter()
            .filter(|c| c.row.location_detail_id == id)
            .collect();
        coords.sort_by_key(|c| c.seq);
        Some(LocationWithCoordinates {
            detail: detail.row.clone(),
            coordinates: coords.into_iter().map(|c| c.row.clone()).collect(),
        })
    }

    /// Ids of details that have at least one coordinate.
    fn located_ids(&self) -> HashSet<Uuid> {
        self.coordinates
            .iter()
            .map(|c| c.row.location_detail_id)
            .collect()
    }
}

/// Thread-safe in-memory store implementing all three repositories.
#[derive(Clone, Default)]
pub struct InMemoryLocationStore {
    inner: Arc<RwLock<Inner>>,
    lookups: Arc<AtomicUsize>,
}

impl InMemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle this store as the three repository trait objects.
    pub fn stores(&self) -> LocationStores {
        LocationStores::from_backend(Arc::new(self.clone()))
    }

    /// Number of address lookups served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Make every subsequent write to `target` fail.
    pub fn fail_writes(&self, target: WriteTarget) -> Result<()> {
        self.write()?.failing.insert(target);
        Ok(())
    }

    /// Number of stored location details.
    pub fn location_count(&self) -> Result<usize> {
        Ok(self.read()?.details.len())
    }

    /// Number of stored coordinates.
    pub fn coordinate_count(&self) -> Result<usize> {
        Ok(self.read()?.coordinates.len())
    }

    /// Number of stored history entries across all users.
    pub fn history_count(&self) -> Result<usize> {
        Ok(self.read()?.history.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| Error::Internal("lock poisoned (read)".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| Error::Internal("lock poisoned (write)".to_string()))
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationStore {
    async fn insert_location(&self, req: NewLocationDetail) -> Result<LocationDetail> {
        let mut inner = self.write()?;
        inner.check_write(WriteTarget::Locations)?;
        let now = Utc::now();
        let detail = LocationDetail {
            id: geofind_core::new_v7(),
            address_key: address_key(&req.address),
            address: req.address,
            formatted_address: req.formatted_address,
            display_name: req.display_name,
            place_type: req.place_type,
            country: req.country,
            state: req.state,
            city: req.city,
            postal_code: req.postal_code,
            user_id: req.user_id,
            created_at: now,
            updated_at: now,
        };
        let seq = inner.next_seq();
        inner.details.insert(
            detail.id,
            Stored {
                seq,
                row: detail.clone(),
            },
        );
        Ok(detail)
    }

    async fn insert_coordinate(&self, req: NewLocationCoordinate) -> Result<LocationCoordinate> {
        validate_coordinates(req.latitude, req.longitude)?;
        let mut inner = self.write()?;
        inner.check_write(WriteTarget::Coordinates)?;
        if !inner.details.contains_key(&req.location_detail_id) {
            return Err(Error::NotFound(format!(
                "location detail {}",
                req.location_detail_id
            )));
        }
        let coord = LocationCoordinate {
            id: geofind_core::new_v7(),
            location_detail_id: req.location_detail_id,
            latitude: req.latitude,
            longitude: req.longitude,
            accuracy: req.accuracy,
            elevation: req.elevation,
            created_at: Utc::now(),
        };
        let seq = inner.next_seq();
        inner.coordinates.push(Stored {
            seq,
            row: coord.clone(),
        });
        Ok(coord)
    }

    async fn fetch_location(&self, id: Uuid) -> Result<Option<LocationWithCoordinates>> {
        Ok(self.read()?.with_coordinates(id))
    }

    async fn find_by_address(&self, address: &str) -> Result<Option<LocationWithCoordinates>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let key = address_key(address);
        if key.is_empty() {
            return Ok(None);
        }
        let inner = self.read()?;
        let oldest = inner
            .details
            .values()
            .filter(|d| d.row.address_key == key)
            .min_by_key(|d| d.seq)
            .map(|d| d.row.id);
        Ok(oldest.and_then(|id| inner.with_coordinates(id)))
    }

    async fn search_by_address(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<LocationWithCoordinates>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let key = address_key(fragment);
        if key.is_empty() || limit <= 0 {
            return Ok(Vec::new());
        }
        let inner = self.read()?;
        let located = inner.located_ids();
        let mut matches: Vec<&Stored<LocationDetail>> = inner
            .details
            .values()
            .filter(|d| located.contains(&d.row.id) && d.row.address_key.contains(&key))
            .collect();
        matches.sort_by_key(|d| (d.row.address_key != key, d.seq));

        Ok(matches
            .into_iter()
            .take(limit as usize)
            .filter_map(|d| inner.with_coordinates(d.row.id))
            .collect())
    }

    async fn delete_location(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.write()?;
        if inner.details.remove(&id).is_none() {
            return Ok(false);
        }
        inner.coordinates.retain(|c| c.row.location_detail_id != id);
        inner.favorites.retain(|f| f.row.location_detail_id != id);
        for entry in inner.history.iter_mut() {
            if entry.row.location_detail_id == Some(id) {
                entry.row.location_detail_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl FavoriteRepository for InMemoryLocationStore {
    async fn insert_favorite(&self, req: NewFavorite) -> Result<Favorite> {
        let mut inner = self.write()?;
        inner.check_write(WriteTarget::Favorites)?;
        if !inner.details.contains_key(&req.location_detail_id) {
            return Err(Error::NotFound(format!(
                "location detail {}",
                req.location_detail_id
            )));
        }
        let favorite = Favorite {
            id: geofind_core::new_v7(),
            user_id: req.user_id,
            location_detail_id: req.location_detail_id,
            name: req.name,
            notes: req.notes,
            created_at: Utc::now(),
        };
        let seq = inner.next_seq();
        inner.favorites.push(Stored {
            seq,
            row: favorite.clone(),
        });
        Ok(favorite)
    }

    async fn get_favorite(&self, id: Uuid) -> Result<Option<Favorite>> {
        Ok(self
            .read()?
            .favorites
            .iter()
            .find(|f| f.row.id == id)
            .map(|f| f.row.clone()))
    }

    async fn find_favorite(
        &self,
        user_id: Uuid,
        location_detail_id: Uuid,
    ) -> Result<Option<Favorite>> {
        Ok(self
            .read()?
            .favorites
            .iter()
            .filter(|f| f.row.user_id == user_id && f.row.location_detail_id == location_detail_id)
            .min_by_key(|f| f.seq)
            .map(|f| f.row.clone()))
    }

    async fn delete_favorite(&self, id: Uuid) -> Result<bool> {
        let mut inner = self.write()?;
        let before = inner.favorites.len();
        inner.favorites.retain(|f| f.row.id != id);
        Ok(inner.favorites.len() < before)
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteWithLocation>> {
        let inner = self.read()?;
        let mut rows: Vec<&Stored<Favorite>> = inner
            .favorites
            .iter()
            .filter(|f| f.row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(rows
            .into_iter()
            .map(|f| FavoriteWithLocation {
                location: inner.with_coordinates(f.row.location_detail_id),
                favorite: f.row.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl SearchHistoryRepository for InMemoryLocationStore {
    async fn insert_history(&self, req: NewSearchHistoryEntry) -> Result<SearchHistoryEntry> {
        let mut inner = self.write()?;
        inner.check_write(WriteTarget::History)?;
        let entry = SearchHistoryEntry {
            id: geofind_core::new_v7(),
            user_id: req.user_id,
            location_detail_id: req.location_detail_id,
            search_query: req.search_query,
            searched_at: Utc::now(),
        };
        let seq = inner.next_seq();
        inner.history.push(Stored {
            seq,
            row: entry.clone(),
        });
        Ok(entry)
    }

    async fn list_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<HistoryWithLocation>> {
        let inner = self.read()?;
        let mut rows: Vec<&Stored<SearchHistoryEntry>> = inner
            .history
            .iter()
            .filter(|h| h.row.user_id == user_id)
            .collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));

        Ok(rows
            .into_iter()
            .take(clamp_history_limit(limit) as usize)
            .map(|h| HistoryWithLocation {
                location: h
                    .row
                    .location_detail_id
                    .and_then(|id| inner.with_coordinates(id)),
                entry: h.row.clone(),
            })
            .collect())
    }

    async fn prune_history(&self, user_id: Uuid, keep: i64) -> Result<u64> {
        let mut inner = self.write()?;
        let mut seqs: Vec<u64> = inner
            .history
            .iter()
            .filter(|h| h.row.user_id == user_id)
            .map(|h| h.seq)
            .collect();
        let keep = keep.max(0) as usize;
        if seqs.len() <= keep {
            return Ok(0);
        }
        seqs.sort_unstable_by(|a, b| b.cmp(a));
        let drop: HashSet<u64> = seqs.into_iter().skip(keep).collect();

        let before = inner.history.len();
        inner.history.retain(|h| !drop.contains(&h.seq));
        Ok((before - inner.history.len()) as u64)
    }
}
