//! # geofind-core
//!
//! Core types, traits, and abstractions for the geofind location lookup
//! service.
//!
//! This crate provides the data model (location details, coordinates,
//! favorites, search history), the repository and geocoder traits that
//! storage and provider crates implement, and shared defaults.

pub mod address;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use address::{address_key, format_coordinate_pair, validate_coordinates};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
