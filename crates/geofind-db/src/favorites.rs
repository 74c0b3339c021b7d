//! Favorite repository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use geofind_core::{
    Error, Favorite, FavoriteRepository, FavoriteWithLocation, NewFavorite, Result,
};

use crate::locations::PgLocationRepository;

/// PostgreSQL favorite repository.
pub struct PgFavoriteRepository {
    pool: Pool<Postgres>,
    locations: PgLocationRepository,
}

impl PgFavoriteRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            locations: PgLocationRepository::new(pool.clone()),
            pool,
        }
    }

    fn parse_row(r: &PgRow) -> Favorite {
        Favorite {
            id: r.get("id"),
            user_id: r.get("user_id"),
            location_detail_id: r.get("location_detail_id"),
            name: r.get("name"),
            notes: r.get("notes"),
            created_at: r.get("created_at"),
        }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn insert_favorite(&self, req: NewFavorite) -> Result<Favorite> {
        let favorite = Favorite {
            id: geofind_core::new_v7(),
            user_id: req.user_id,
            location_detail_id: req.location_detail_id,
            name: req.name,
            notes: req.notes,
            created_at: Utc::now(),
        };
        sqlx::query(
            "INSERT INTO favorites (id, user_id, location_detail_id, name, notes, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(favorite.id)
        .bind(favorite.user_id)
        .bind(favorite.location_detail_id)
        .bind(&favorite.name)
        .bind(&favorite.notes)
        .bind(favorite.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(favorite)
    }

    async fn get_favorite(&self, id: Uuid) -> Result<Option<Favorite>> {
        let row = sqlx::query(
            "SELECT id, user_id, location_detail_id, name, notes, created_at
             FROM favorites WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn find_favorite(
        &self,
        user_id: Uuid,
        location_detail_id: Uuid,
    ) -> Result<Option<Favorite>> {
        let row = sqlx::query(
            "SELECT id, user_id, location_detail_id, name, notes, created_at
             FROM favorites
             WHERE user_id = $1 AND location_detail_id = $2
             ORDER BY created_at ASC, id ASC
             LIMIT 1",
        )
        .bind(user_id)
        .bind(location_detail_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_row))
    }

    async fn delete_favorite(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM favorites WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_favorites(&self, user_id: Uuid) -> Result<Vec<FavoriteWithLocation>> {
        let rows = sqlx::query(
            "SELECT id, user_id, location_detail_id, name, notes, created_at
             FROM favorites
             WHERE user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let favorites: Vec<Favorite> = rows.iter().map(Self::parse_row).collect();
        let detail_ids: Vec<Uuid> = favorites.iter().map(|f| f.location_detail_id).collect();
        let locations = self.locations.fetch_many(&detail_ids).await?;

        Ok(favorites
            .into_iter()
            .map(|favorite| FavoriteWithLocation {
                location: locations.get(&favorite.location_detail_id).cloned(),
                favorite,
            })
            .collect())
    }
}
