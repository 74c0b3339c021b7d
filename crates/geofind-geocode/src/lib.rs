//! # geofind-geocode
//!
//! Forward geocoding backends for geofind.
//!
//! This crate provides:
//! - Nominatim implementation of the [`Geocoder`] trait (default)
//! - TOML and environment configuration
//! - A mock geocoder for tests (feature `mock`)
//!
//! # Example
//!
//! ```rust,no_run
//! use geofind_geocode::NominatimGeocoder;
//! use geofind_core::Geocoder;
//!
//! #[tokio::main]
//! async fn main() {
//!     let geocoder = NominatimGeocoder::from_env().unwrap();
//!     let hit = geocoder.geocode("10 Downing Street, London").await.unwrap();
//!     println!("{:?}", hit);
//! }
//! ```

pub mod config;

#[cfg(feature = "nominatim")]
pub mod nominatim;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use geofind_core::*;

pub use config::{ConfigError, ConfigResult, GeocoderConfig};

#[cfg(feature = "nominatim")]
pub use nominatim::NominatimGeocoder;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockGeocoder, MockResponse};
