//! Occurrence generation on top of the `rrule` crate.
//!
//! Every expansion starts at DTSTART, so an occurrence's position (and thus
//! its sequence number) does not depend on where a previous pass stopped.

use chrono::{DateTime, Utc};
use rrule::{RRule, Tz, Unvalidated};

use cadence_core::constants::MAX_SERIES_OCCURRENCES;

use super::rule::RecurrenceSpec;
use crate::error::{ServiceError, ServiceResult};

/// One generated occurrence: its identity key and 1-based series position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub sequence_number: u32,
}

/// `rrule` flags a result as limited whenever it holds exactly `limit`
/// dates, so expansion asks for one more than the cap and length decides.
const EXPANSION_LIMIT: u16 = MAX_SERIES_OCCURRENCES + 1;

/// Expands every occurrence start in `[spec.start, min(until, spec.end)]`,
/// stopping after `EXPANSION_LIMIT` dates.
fn expand(spec: &RecurrenceSpec, until: DateTime<Utc>) -> ServiceResult<Vec<DateTime<Utc>>> {
    let until = until.min(spec.end);
    if until < spec.start {
        return Ok(Vec::new());
    }

    let rrule = spec
        .rrule_body(until)
        .parse::<RRule<Unvalidated>>()
        .map_err(|err| ServiceError::invalid_arguments(&["input", "recurrence"], err.to_string()))?;
    let rrule_set = rrule
        .build(spec.start.with_timezone(&Tz::UTC))
        .map_err(|err| ServiceError::invalid_arguments(&["input", "recurrence"], err.to_string()))?;

    Ok(rrule_set
        .all(EXPANSION_LIMIT)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .collect())
}

/// ## Summary
/// Generates up to `limit` occurrences strictly after `after` (or from the
/// series start when `None`) and no later than `until`.
///
/// Output is ordered by start time and sequence numbers are contiguous.
///
/// ## Errors
/// Returns `InvalidArguments` if the rule cannot be expanded.
pub fn occurrences(
    spec: &RecurrenceSpec,
    after: Option<DateTime<Utc>>,
    until: DateTime<Utc>,
    limit: usize,
) -> ServiceResult<Vec<Occurrence>> {
    let dates = expand(spec, until)?;

    Ok(dates
        .into_iter()
        .zip(1_u32..)
        .filter(|(start, _)| after.is_none_or(|cursor| *start > cursor))
        .take(limit)
        .map(|(start, sequence_number)| Occurrence {
            start,
            sequence_number,
        })
        .collect())
}

/// ## Summary
/// Counts every occurrence of the bounded series.
///
/// ## Errors
/// Returns `InvalidArguments` if the rule cannot be expanded or the series
/// is longer than `MAX_SERIES_OCCURRENCES`.
pub fn total_count(spec: &RecurrenceSpec) -> ServiceResult<u32> {
    let dates = expand(spec, spec.end)?;
    if dates.len() > usize::from(MAX_SERIES_OCCURRENCES) {
        return Err(ServiceError::invalid_arguments(
            &["input", "recurrence", "endDate"],
            format!("A recurring series may not exceed {MAX_SERIES_OCCURRENCES} occurrences"),
        ));
    }
    u32::try_from(dates.len()).map_err(|_err| {
        ServiceError::invalid_arguments(&["input", "recurrence", "endDate"], "Series is too long")
    })
}
