//! # geofind-db
//!
//! Storage layer for geofind.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL repositories for location details, coordinates, favorites,
//!   and search history
//! - An in-memory store implementing the same traits
//!
//! ## Example
//!
//! ```rust,ignore
//! use geofind_db::{Database, LocationRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/geofind").await?;
//!     let hit = db.locations.find_by_address("10 Downing Street").await?;
//!     println!("cached: {}", hit.is_some());
//!     Ok(())
//! }
//! ```
pub mod favorites;
pub mod history;
pub mod locations;
pub mod memory;
pub mod pool;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

// Re-export core types
pub use geofind_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use favorites::PgFavoriteRepository;
pub use history::{clamp_history_limit, PgSearchHistoryRepository};
pub use locations::PgLocationRepository;
pub use memory::{InMemoryLocationStore, WriteTarget};
pub use pool::{create_pool_with_config, log_pool_metrics, PoolConfig};

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Location details and coordinates.
    pub locations: PgLocationRepository,
    /// User favorites.
    pub favorites: PgFavoriteRepository,
    /// Search history.
    pub history: PgSearchHistoryRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            locations: PgLocationRepository::new(pool.clone()),
            favorites: PgFavoriteRepository::new(pool.clone()),
            history: PgSearchHistoryRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect using the pool settings from the environment.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_config(url, &PoolConfig::from_env()).await
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: &PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Repository trait objects backed by this pool.
    pub fn stores(&self) -> LocationStores {
        LocationStores {
            locations: std::sync::Arc::new(PgLocationRepository::new(self.pool.clone())),
            favorites: std::sync::Arc::new(PgFavoriteRepository::new(self.pool.clone())),
            history: std::sync::Arc::new(PgSearchHistoryRepository::new(self.pool.clone())),
        }
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
