//! Search history repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use geofind_core::defaults::HISTORY_PAGE_LIMIT;
use geofind_core::{
    Error, HistoryWithLocation, NewSearchHistoryEntry, Result, SearchHistoryEntry,
    SearchHistoryRepository,
};

use crate::locations::PgLocationRepository;

/// Clamp a requested history page size to `1..=HISTORY_PAGE_LIMIT`.
pub fn clamp_history_limit(limit: i64) -> i64 {
    limit.clamp(1, HISTORY_PAGE_LIMIT)
}

/// PostgreSQL search history repository.
pub struct PgSearchHistoryRepository {
    pool: Pool<Postgres>,
    locations: PgLocationRepository,
}

impl PgSearchHistoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            locations: PgLocationRepository::new(pool.clone()),
            pool,
        }
    }

    fn parse_row(r: &PgRow) -> SearchHistoryEntry {
        SearchHistoryEntry {
            id: r.get("id"),
            user_id: r.get("user_id"),
            location_detail_id: r.get("location_detail_id"),
            search_query: r.get("search_query"),
            searched_at: r.get("searched_at"),
        }
    }
}

#[async_trait]
impl SearchHistoryRepository for PgSearchHistoryRepository {
    async fn insert_history(&self, req: NewSearchHistoryEntry) -> Result<SearchHistoryEntry> {
        let entry = SearchHistoryEntry {
            id: geofind_core::new_v7(),
            user_id: req.user_id,
            location_detail_id: req.location_detail_id,
            search_query: req.search_query,
            searched_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO search_history (id, user_id, location_detail_id, search_query, searched_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.id)
        .bind(entry.user_id)
        .bind(entry.location_detail_id)
        .bind(&entry.search_query)
        .bind(entry.searched_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(entry)
    }

    async fn list_history(&self, user_id: Uuid, limit: i64) -> Result<Vec<HistoryWithLocation>> {
        let rows = sqlx::query(
            "SELECT id, user_id, location_detail_id, search_query, searched_at
             FROM search_history
             WHERE user_id = $1
             ORDER BY searched_at DESC, id DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(clamp_history_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let entries: Vec<SearchHistoryEntry> = rows.iter().map(Self::parse_row).collect();
        let detail_ids: Vec<Uuid> = entries
            .iter()
            .filter_map(|e| e.location_detail_id)
            .collect();
        let locations = self.locations.fetch_many(&detail_ids).await?;

        Ok(entries
            .into_iter()
            .map(|entry| HistoryWithLocation {
                location: entry
                    .location_detail_id
                    .and_then(|id| locations.get(&id).cloned()),
                entry,
            })
            .collect())
    }

    async fn prune_history(&self, user_id: Uuid, keep: i64) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM search_history
             WHERE user_id = $1
               AND id NOT IN (
                   SELECT id FROM search_history
                   WHERE user_id = $1
                   ORDER BY searched_at DESC, id DESC
                   LIMIT $2
               )",
        )
        .bind(user_id)
        .bind(keep.max(0))
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        let deleted = result.rows_affected();
        if deleted > 0 {
            debug!(
                subsystem = "db",
                component = "pg_history",
                op = "prune_history",
                user_id = %user_id,
                deleted,
                "Pruned search history"
            );
        }
        Ok(deleted)
    }
}
