use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

/// All entity identifiers are UUIDs.
pub type EntityId = Uuid;

/// All timestamps are UTC.
pub type Timestamp = DateTime<Utc>;

/// Convert an instant to whole seconds since the UNIX epoch.
pub fn to_unix(ts: Timestamp) -> i64 {
    ts.timestamp()
}

/// Convert whole seconds since the UNIX epoch to an instant.
///
/// Returns `None` for values chrono cannot represent.
pub fn from_unix(secs: i64) -> Option<Timestamp> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Wire form of an optional instant: `0` stands for "unset".
pub fn optional_to_unix(ts: Option<Timestamp>) -> i64 {
    ts.map(to_unix).unwrap_or(0)
}

/// Inverse of [`optional_to_unix`]: `0` (or an unrepresentable value) is `None`.
pub fn optional_from_unix(secs: i64) -> Option<Timestamp> {
    if secs == 0 {
        None
    } else {
        from_unix(secs)
    }
}
