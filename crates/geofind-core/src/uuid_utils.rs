//! UUID v7 helpers for time-ordered identifiers.
//!
//! Every geofind record id is a UUIDv7, so ids generated later sort after
//! earlier ones and serve as a recency tie-break when two rows share a
//! timestamp.

use uuid::Uuid;

/// Generate a new UUIDv7 identifier.
///
/// ```
/// use geofind_core::uuid_utils::{is_v7, new_v7};
///
/// assert!(is_v7(&new_v7()));
/// ```
#[inline]
pub fn new_v7() -> Uuid {
    Uuid::now_v7()
}

/// Check if a UUID is version 7.
#[inline]
pub fn is_v7(uuid: &Uuid) -> bool {
    uuid.get_version_num() == 7
}
