//! Instant helpers shared by the materializer and its callers.

use chrono::{DateTime, Months, SubsecRound, Utc};

/// ## Summary
/// Drops sub-second precision. Occurrence identity keys are compared at
/// whole-second resolution, matching what the recurrence generator emits.
#[must_use]
pub fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(0)
}

/// ## Summary
/// Adds calendar months, clamping to `DateTime::<Utc>::MAX_UTC` on overflow.
#[must_use]
pub fn add_months_saturating(instant: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    instant
        .checked_add_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// ## Summary
/// Subtracts calendar months, clamping to `DateTime::<Utc>::MIN_UTC` on overflow.
#[must_use]
pub fn sub_months_saturating(instant: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    instant
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
