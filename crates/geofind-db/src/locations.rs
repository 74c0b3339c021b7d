//! Location detail and coordinate repository.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use geofind_core::{
    address_key, Error, LocationCoordinate, LocationDetail, LocationRepository,
    LocationWithCoordinates, NewLocationCoordinate, NewLocationDetail, Result,
};

use crate::escape_like;

const DETAIL_COLUMNS: &str = "id, address, address_key, formatted_address, display_name, \
     place_type, country, state, city, postal_code, user_id, created_at, updated_at";

const COORDINATE_COLUMNS: &str =
    "id, location_detail_id, latitude, longitude, accuracy, elevation, created_at";

/// PostgreSQL location repository.
pub struct PgLocationRepository {
    pool: Pool<Postgres>,
}

impl PgLocationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_detail(r: &PgRow) -> LocationDetail {
        LocationDetail {
            id: r.get("id"),
            address: r.get("address"),
            address_key: r.get("address_key"),
            formatted_address: r.get("formatted_address"),
            display_name: r.get("display_name"),
            place_type: r.get("place_type"),
            country: r.get("country"),
            state: r.get("state"),
            city: r.get("city"),
            postal_code: r.get("postal_code"),
            user_id: r.get("user_id"),
            created_at: r.get("created_at"),
            updated_at: r.get("updated_at"),
        }
    }

    fn parse_coordinate(r: &PgRow) -> LocationCoordinate {
        LocationCoordinate {
            id: r.get("id"),
            location_detail_id: r.get("location_detail_id"),
            latitude: r.get("latitude"),
            longitude: r.get("longitude"),
            accuracy: r.get("accuracy"),
            elevation: r.get("elevation"),
            created_at: r.get("created_at"),
        }
    }

    /// Attach coordinates to a batch of details with a single query.
    async fn attach_coordinates(
        &self,
        details: Vec<LocationDetail>,
    ) -> Result<Vec<LocationWithCoordinates>> {
        if details.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = details.iter().map(|d| d.id).collect();
        let rows = sqlx::query(&format!(
            "SELECT {COORDINATE_COLUMNS} FROM location_coordinates
             WHERE location_detail_id = ANY($1)
             ORDER BY created_at ASC, id ASC"
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_detail: HashMap<Uuid, Vec<LocationCoordinate>> = HashMap::new();
        for row in &rows {
            let coord = Self::parse_coordinate(row);
            by_detail
                .entry(coord.location_detail_id)
                .or_default()
                .push(coord);
        }

        Ok(details
            .into_iter()
            .map(|detail| LocationWithCoordinates {
                coordinates: by_detail.remove(&detail.id).unwrap_or_default(),
                detail,
            })
            .collect())
    }

    /// Fetch several details (with coordinates) keyed by id.
    pub(crate) async fn fetch_many(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, LocationWithCoordinates>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM location_details WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let details = rows.iter().map(Self::parse_detail).collect();
        Ok(self
            .attach_coordinates(details)
            .await?
            .into_iter()
            .map(|l| (l.detail.id, l))
            .collect())
    }
}

#[async_trait]
impl LocationRepository for PgLocationRepository {
    async fn insert_location(&self, req: NewLocationDetail) -> Result<LocationDetail> {
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

        sqlx::query(&format!(
            "INSERT INTO location_details ({DETAIL_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(detail.id)
        .bind(&detail.address)
        .bind(&detail.address_key)
        .bind(&detail.formatted_address)
        .bind(&detail.display_name)
        .bind(&detail.place_type)
        .bind(&detail.country)
        .bind(&detail.state)
        .bind(&detail.city)
        .bind(&detail.postal_code)
        .bind(detail.user_id)
        .bind(detail.created_at)
        .bind(detail.updated_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "pg_locations",
            op = "insert_location",
            location_id = %detail.id,
            "Inserted location detail"
        );
        Ok(detail)
    }

    async fn insert_coordinate(&self, req: NewLocationCoordinate) -> Result<LocationCoordinate> {
        geofind_core::validate_coordinates(req.latitude, req.longitude)?;
        let coord = LocationCoordinate {
            id: geofind_core::new_v7(),
            location_detail_id: req.location_detail_id,
            latitude: req.latitude,
            longitude: req.longitude,
            accuracy: req.accuracy,
            elevation: req.elevation,
            created_at: Utc::now(),
        };

        sqlx::query(&format!(
            "INSERT INTO location_coordinates ({COORDINATE_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(coord.id)
        .bind(coord.location_detail_id)
        .bind(coord.latitude)
        .bind(coord.longitude)
        .bind(coord.accuracy)
        .bind(coord.elevation)
        .bind(coord.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(coord)
    }

    async fn fetch_location(&self, id: Uuid) -> Result<Option<LocationWithCoordinates>> {
        Ok(self.fetch_many(&[id]).await?.remove(&id))
    }

    async fn find_by_address(&self, address: &str) -> Result<Option<LocationWithCoordinates>> {
        let key = address_key(address);
        if key.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM location_details
             WHERE address_key = $1
             ORDER BY created_at ASC, id ASC
             LIMIT 1"
        ))
        .bind(&key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        match row {
            Some(r) => Ok(self
                .attach_coordinates(vec![Self::parse_detail(&r)])
                .await?
                .pop()),
            None => Ok(None),
        }
    }

    async fn search_by_address(
        &self,
        fragment: &str,
        limit: i64,
    ) -> Result<Vec<LocationWithCoordinates>> {
        let key = address_key(fragment);
        if key.is_empty() || limit <= 0 {
            return Ok(Vec::new());
        }
        let pattern = format!("%{}%", escape_like(&key));

        let rows = sqlx::query(&format!(
            "SELECT {DETAIL_COLUMNS} FROM location_details d
             WHERE d.address_key ILIKE $1
               AND EXISTS (
                   SELECT 1 FROM location_coordinates c WHERE c.location_detail_id = d.id
               )
             ORDER BY (d.address_key = $2) DESC, d.created_at ASC, d.id ASC
             LIMIT $3"
        ))
        .bind(&pattern)
        .bind(&key)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "pg_locations",
            op = "search_by_address",
            result_count = rows.len(),
            "Address substring lookup"
        );

        let details = rows.iter().map(Self::parse_detail).collect();
        self.attach_coordinates(details).await
    }

    async fn delete_location(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM location_details WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
