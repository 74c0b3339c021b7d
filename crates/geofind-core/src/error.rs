//! Error types for geofind.

use thiserror::Error;

/// Result type alias using geofind's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for geofind operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// The geocoding provider returned no candidate for the query
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// Favorite not found (or not owned by the caller)
    #[error("Favorite not found: {0}")]
    FavoriteNotFound(uuid::Uuid),

    /// Input rejected before any storage or network call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Geocoding provider failed (transport, non-2xx, malformed payload)
    #[error("Geocoding error: {0}")]
    Geocoding(String),

    /// The action needs an authenticated user
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
