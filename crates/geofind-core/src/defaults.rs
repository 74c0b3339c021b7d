//! Centralized default constants for geofind.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// GEOCODING
// =============================================================================

/// Default geocoding endpoint (OpenStreetMap Nominatim).
pub const GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Client identification header sent with every geocoding request.
pub const GEOCODER_USER_AGENT: &str = "LocationFinder/1.0";

/// Timeout for a single geocoding request (seconds).
pub const GEOCODER_TIMEOUT_SECS: u64 = 30;

/// Number of candidates requested from the provider.
pub const GEOCODER_RESULT_LIMIT: u32 = 1;

// =============================================================================
// HISTORY / FAVORITES
// =============================================================================

/// Maximum number of history entries returned by a listing.
pub const HISTORY_PAGE_LIMIT: i64 = 20;

/// Number of history entries kept per user; older ones are pruned.
pub const HISTORY_RETENTION: i64 = 100;

// =============================================================================
// COORDINATES
// =============================================================================

/// Decimal places used when a coordinate pair is rendered as text.
pub const COORDINATE_DISPLAY_PRECISION: usize = 6;

/// External map link template base.
pub const EXTERNAL_MAP_URL: &str = "https://maps.google.com/?q=";

// =============================================================================
// SELECTION
// =============================================================================

/// Buffer of the selection change broadcast channel.
pub const SELECTION_EVENT_CAPACITY: usize = 64;

/// Session key used when a client does not send one.
pub const DEFAULT_SESSION: &str = "default";

/// A session with no subscriber and no activity for this long is dropped.
pub const SELECTION_IDLE_TTL_SECS: u64 = 30 * 60;

/// Sessions kept before idle ones are evicted to make room.
pub const SELECTION_MAX_SESSIONS: usize = 10_000;

/// How often idle selection sessions are swept.
pub const SELECTION_SWEEP_INTERVAL_SECS: u64 = 60;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 3000;

/// Default bind address.
pub const SERVER_HOST: &str = "0.0.0.0";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_limits_are_consistent() {
        assert!(HISTORY_PAGE_LIMIT > 0);
        assert!(HISTORY_RETENTION >= HISTORY_PAGE_LIMIT);
    }

    #[test]
    fn test_geocoder_defaults() {
        assert!(GEOCODER_URL.starts_with("https://"));
        assert!(!GEOCODER_USER_AGENT.is_empty());
        assert_eq!(GEOCODER_RESULT_LIMIT, 1);
    }
}
