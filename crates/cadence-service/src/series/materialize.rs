//! Persisting generated occurrences and advancing the horizon.
//!
//! A pass computes its occurrences outside the transaction, then inside it
//! first advances `latest_instance_date` with a compare-and-swap on the rule
//! version and only then inserts. A pass that loses the swap writes nothing.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::Serialize;
use uuid::Uuid;

use cadence_core::config::MaterializationConfig;
use cadence_core::util::time::add_months_saturating;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{recurrence_rule, recurring_instance};
use cadence_db::model::event::Event;
use cadence_db::model::recurrence::{NewRecurringEventInstance, RecurrenceRule};

use super::{LoadedSeries, NOT_A_TEMPLATE, load_series};
use crate::auth::{Action, Authorizer, Caller};
use crate::error::{ServiceError, ServiceResult};
use crate::recurrence::{Occurrence, RecurrenceSpec, plan_extension};

/// Upper bound on consecutive lost races tolerated by [`extend_until`].
const MAX_SUPERSEDED_PASSES: u32 = 8;

/// Result of one extension pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtensionOutcome {
    /// The horizon moved; `inserted` rows were written.
    Advanced {
        inserted: usize,
        latest_instance_date: DateTime<Utc>,
    },
    /// Nothing left to materialize within the requested reach.
    UpToDate,
    /// Another writer advanced (or deleted) the rule first; nothing was written.
    Superseded,
}

/// Converts a generator count into the `INTEGER` column domain.
pub(crate) fn to_db_count(value: u32) -> ServiceResult<i32> {
    i32::try_from(value)
        .map_err(|_err| ServiceError::Unexpected(format!("count {value} exceeds column range")))
}

/// ## Summary
/// Builds instance rows for generated occurrences, applying the template's
/// duration to each start.
///
/// ## Errors
/// Returns `Unexpected` if a sequence number does not fit the column.
pub(crate) fn instance_rows(
    template: &Event,
    rule: &RecurrenceRule,
    series_id: Uuid,
    occurrences: &[Occurrence],
) -> ServiceResult<Vec<NewRecurringEventInstance>> {
    let duration = template.duration();

    occurrences
        .iter()
        .map(|occurrence| {
            Ok(NewRecurringEventInstance {
                id: Uuid::now_v7(),
                base_recurring_event_id: template.id,
                recurrence_rule_id: rule.id,
                original_series_id: series_id,
                organization_id: template.organization_id,
                original_instance_start_time: occurrence.start,
                actual_start_time: occurrence.start,
                actual_end_time: occurrence.start + duration,
                sequence_number: to_db_count(occurrence.sequence_number)?,
                total_count: rule.total_count,
            })
        })
        .collect()
}

/// ## Summary
/// Runs one extension pass for a template, resuming strictly after the
/// rule's `latest_instance_date`.
///
/// With `target` set the pass stops there; otherwise it reaches one
/// configured window ahead.
///
/// ## Side Effects
/// Inserts instance rows and advances the rule's horizon and version.
///
/// ## Errors
/// Returns `NotFound`/`InvalidArguments` from series loading, or a database error.
#[tracing::instrument(skip(conn, policy), fields(template_id = %template_id))]
pub async fn extend_horizon(
    conn: &mut DbConnection<'_>,
    policy: &MaterializationConfig,
    template_id: Uuid,
    target: Option<DateTime<Utc>>,
) -> ServiceResult<ExtensionOutcome> {
    let LoadedSeries {
        template,
        rule,
        series_id,
    } = load_series(conn, template_id, NOT_A_TEMPLATE).await?;

    let spec = RecurrenceSpec::from_rule(&rule)?;
    let plan = plan_extension(&spec, rule.latest_instance_date, target, policy)?;
    let Some(last) = plan.last().copied() else {
        tracing::debug!(
            latest_instance_date = %rule.latest_instance_date,
            "Series already materialized up to the requested horizon"
        );
        return Ok(ExtensionOutcome::UpToDate);
    };

    let rows = instance_rows(&template, &rule, series_id, &plan)?;
    let rule_id = rule.id;
    let expected_version = rule.version;

    conn.transaction::<_, ServiceError, _>(move |tx| {
        async move {
            let advanced =
                recurrence_rule::advance_horizon(tx, rule_id, expected_version, last.start).await?;
            if advanced == 0 {
                tracing::debug!(
                    rule_id = %rule_id,
                    expected_version,
                    "Horizon already advanced by a concurrent writer"
                );
                return Ok(ExtensionOutcome::Superseded);
            }

            let inserted = recurring_instance::insert_missing(tx, &rows).await?;
            tracing::info!(
                rule_id = %rule_id,
                generated = rows.len(),
                inserted,
                latest_instance_date = %last.start,
                "Materialization horizon advanced"
            );

            Ok(ExtensionOutcome::Advanced {
                inserted,
                latest_instance_date: last.start,
            })
        }
        .scope_boxed()
    })
    .await
}

/// ## Summary
/// Extends a series until its horizon reaches `target`, the series is
/// exhausted, or concurrent writers keep winning.
///
/// Returns the number of instance rows this caller inserted.
///
/// ## Errors
/// Same as [`extend_horizon`].
#[tracing::instrument(skip(conn, policy), fields(template_id = %template_id, target = %target))]
pub async fn extend_until(
    conn: &mut DbConnection<'_>,
    policy: &MaterializationConfig,
    template_id: Uuid,
    target: DateTime<Utc>,
) -> ServiceResult<usize> {
    let mut inserted_total = 0;
    let mut superseded = 0;

    loop {
        match extend_horizon(conn, policy, template_id, Some(target)).await? {
            ExtensionOutcome::Advanced {
                inserted,
                latest_instance_date,
            } => {
                inserted_total += inserted;
                if latest_instance_date >= target {
                    break;
                }
            }
            ExtensionOutcome::UpToDate => break,
            ExtensionOutcome::Superseded => {
                superseded += 1;
                if superseded >= MAX_SUPERSEDED_PASSES {
                    tracing::debug!(superseded, "Giving up after repeated lost races");
                    break;
                }
            }
        }
    }

    Ok(inserted_total)
}

/// ## Summary
/// Explicit extension requested by an organizer: one pass, optionally up to
/// `until`.
///
/// ## Errors
/// - `Unauthorized` if the caller may not manage the template's organization.
/// - Anything [`extend_horizon`] returns.
#[tracing::instrument(skip(conn, authorizer, policy), fields(template_id = %template_id, caller = %caller.user_id))]
pub async fn extend_series(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    policy: &MaterializationConfig,
    caller: Caller,
    template_id: Uuid,
    until: Option<DateTime<Utc>>,
) -> ServiceResult<ExtensionOutcome> {
    let loaded = load_series(conn, template_id, NOT_A_TEMPLATE).await?;
    authorizer
        .require(
            conn,
            caller,
            loaded.template.organization_id,
            None,
            Action::ExtendSeries,
            &["input", "id"],
        )
        .await?;

    match until {
        Some(target) => {
            let inserted = extend_until(conn, policy, template_id, target).await?;
            let rule = recurrence_rule::by_id(loaded.rule.id)
                .select(RecurrenceRule::as_select())
                .first(conn)
                .await?;
            Ok(if inserted == 0 && rule.version == loaded.rule.version {
                ExtensionOutcome::UpToDate
            } else {
                ExtensionOutcome::Advanced {
                    inserted,
                    latest_instance_date: rule.latest_instance_date,
                }
            })
        }
        None => extend_horizon(conn, policy, template_id, None).await,
    }
}

/// ## Summary
/// Maintenance sweep: extends every series whose horizon is less than one
/// window ahead of `now`.
///
/// Returns the number of instance rows inserted across all series.
///
/// ## Errors
/// Returns a database error if the sweep query fails. Failures on individual
/// series are logged and skipped.
#[tracing::instrument(skip(conn, policy))]
pub async fn materialize_due_series(
    conn: &mut DbConnection<'_>,
    policy: &MaterializationConfig,
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    let target = add_months_saturating(now, policy.window_months);
    let due: Vec<RecurrenceRule> = recurrence_rule::due_for_extension(target)
        .select(RecurrenceRule::as_select())
        .load(conn)
        .await?;

    tracing::info!(due = due.len(), target = %target, "Sweeping series due for extension");

    let mut inserted_total = 0;
    for rule in due {
        match extend_until(conn, policy, rule.base_recurring_event_id, target).await {
            Ok(inserted) => inserted_total += inserted,
            Err(err) => {
                tracing::warn!(
                    rule_id = %rule.id,
                    error = %err,
                    "Skipping series that failed to extend"
                );
            }
        }
    }

    Ok(inserted_total)
}
