//! Wall-clock derived identifiers.

use crate::allocator::RecordId;
use crate::{IdError, IdResult};
use chrono::{DateTime, Utc};

/// Generates a timestamp-derived id (unix milliseconds).
///
/// If `last` is provided, the result is strictly greater than it, even when the clock has not
/// moved on or has stepped backwards. Call this while holding exclusive access to the collection
/// that `last` was read from.
pub fn next_timestamp_id<I: RecordId>(last: Option<I>) -> IdResult<I> {
    next_timestamp_id_at(Utc::now(), last)
}

/// Same as [`next_timestamp_id`] with an explicit clock reading.
pub fn next_timestamp_id_at<I: RecordId>(now: DateTime<Utc>, last: Option<I>) -> IdResult<I> {
    let millis = u64::try_from(now.timestamp_millis()).map_err(|_| {
        IdError::InvalidInput(format!("timestamp {now} precedes the unix epoch"))
    })?;

    let id = match last.map(Into::<u64>::into) {
        Some(prev) if millis <= prev => prev
            .checked_add(1)
            .ok_or(IdError::Exhausted(I::COLLECTION))?,
        _ => millis,
    };

    Ok(I::from(id))
}
