//! Horizon policy: how far ahead each materialization pass reaches.

use chrono::{DateTime, TimeDelta, Utc};

use cadence_core::config::MaterializationConfig;
use cadence_core::util::time::add_months_saturating;

use super::generator::{Occurrence, occurrences};
use super::rule::RecurrenceSpec;
use crate::error::ServiceResult;

/// ## Summary
/// Plans the first pass for a new series: from the series start up to
/// `max(now, start) + window_months`, capped by `initial_instance_count`
/// and the series end.
///
/// ## Errors
/// Returns `InvalidArguments` if the rule cannot be expanded.
pub fn plan_initial(
    spec: &RecurrenceSpec,
    policy: &MaterializationConfig,
    now: DateTime<Utc>,
) -> ServiceResult<Vec<Occurrence>> {
    let anchor = now.max(spec.start);
    let window_end = add_months_saturating(anchor, policy.window_months).min(spec.end);

    occurrences(
        spec,
        None,
        window_end,
        usize::from(policy.initial_instance_count),
    )
}

/// ## Summary
/// Plans one extension pass resuming strictly after `latest`.
///
/// With an explicit `target` the pass stops there; otherwise it reaches one
/// window past `latest` and, if that window holds no occurrence, pulls the
/// next single occurrence so an explicit extension always makes progress
/// until the series is exhausted.
///
/// ## Errors
/// Returns `InvalidArguments` if the rule cannot be expanded.
pub fn plan_extension(
    spec: &RecurrenceSpec,
    latest: DateTime<Utc>,
    target: Option<DateTime<Utc>>,
    policy: &MaterializationConfig,
) -> ServiceResult<Vec<Occurrence>> {
    if latest >= spec.end {
        return Ok(Vec::new());
    }

    let limit = usize::from(policy.initial_instance_count);
    let window_end = target
        .unwrap_or_else(|| add_months_saturating(latest, policy.window_months))
        .min(spec.end);

    let next = occurrences(spec, Some(latest), window_end, limit)?;
    if next.is_empty() && target.is_none() {
        return occurrences(spec, Some(latest), spec.end, 1);
    }
    Ok(next)
}

/// ## Summary
/// Decides whether a read of `[.., range_end)` must extend the horizon first.
///
/// Returns the instant materialization has to reach, or `None` when no
/// occurrence lies between the horizon and that instant (or the series is
/// fully materialized).
///
/// ## Errors
/// Returns `InvalidArguments` if the rule cannot be expanded.
pub fn extension_target(
    spec: &RecurrenceSpec,
    latest: DateTime<Utc>,
    range_end: DateTime<Utc>,
    policy: &MaterializationConfig,
) -> ServiceResult<Option<DateTime<Utc>>> {
    if latest >= spec.end {
        return Ok(None);
    }

    let threshold = TimeDelta::days(i64::from(policy.extension_threshold_days));
    let target = range_end
        .checked_add_signed(threshold)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
        .min(spec.end);
    if target <= latest {
        return Ok(None);
    }

    let next = occurrences(spec, Some(latest), target, 1)?;
    Ok((!next.is_empty()).then_some(target))
}
