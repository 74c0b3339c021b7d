//! Structured logging schema and field name constants for geofind.
//!
//! All crates use these names for structured `tracing` fields so log
//! aggregation can query by the same keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, result still returned (e.g. cache write failed) |
//! | INFO  | Lifecycle events (startup, shutdown), resolution outcomes |
//! | DEBUG | Decision points (cache hit/miss, selection ticket applied or dropped) |
//! | TRACE | Per-row detail |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the HTTP request.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "geocode", "resolver", "recorder", "selection"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "nominatim", "pool", "pg_locations", "memory_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "resolve", "toggle_favorite", "geocode", "prune_history"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Authenticated user id, if any.
pub const USER_ID: &str = "user_id";

/// LocationDetail UUID being operated on.
pub const LOCATION_ID: &str = "location_id";

/// Favorite UUID being operated on.
pub const FAVORITE_ID: &str = "favorite_id";

/// Free-text geocoding query.
pub const QUERY: &str = "query";

/// Selection session key.
pub const SESSION: &str = "session";

/// Selection sequence number.
pub const SEQUENCE: &str = "sequence";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows or candidates returned.
pub const RESULT_COUNT: &str = "result_count";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table affected.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Where a resolution came from ("cache", "geocoder").
pub const SOURCE: &str = "source";

/// Whether a geocoded result was written back to the store.
pub const PERSISTED: &str = "persisted";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
