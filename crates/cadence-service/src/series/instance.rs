//! Per-occurrence reads and edits.
//!
//! Timing edits go to the instance's `actual_*` columns; detail edits are
//! stored as overrides layered over the template. An instance's identity key
//! and sequence number are fixed at generation.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::util::time::truncate_to_seconds;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{event, exception, recurring_instance};
use cadence_db::model::event::Event;
use cadence_db::model::exception::{EventException, EventOverrides, NewEventException};
use cadence_db::model::recurrence::RecurringEventInstance;

use super::EVENT_NOT_FOUND;
use crate::auth::{Action, Authorizer, Caller};
use crate::error::{ServiceError, ServiceResult};

pub(crate) const INSTANCE_PATH: &[&str] = &["input", "id"];
pub(crate) const INSTANCE_NOT_FOUND: &str = "Recurring event instance not found.";
pub(crate) const CANCELLED_INSTANCE: &str = "Cannot update a cancelled recurring event instance.";
pub(crate) const NOTHING_TO_UPDATE: &str = "At least one field must be provided for update.";

/// Template details as one occurrence presents them, overrides applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::struct_excessive_bools)]
pub struct InstanceDetails {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub all_day: bool,
    pub is_public: bool,
    pub is_registerable: bool,
    pub is_invite_only: bool,
}

impl InstanceDetails {
    #[must_use]
    pub fn resolve(template: &Event, overrides: &EventOverrides) -> Self {
        Self {
            name: overrides
                .name
                .clone()
                .unwrap_or_else(|| template.name.clone()),
            description: overrides
                .description
                .clone()
                .or_else(|| template.description.clone()),
            location: overrides
                .location
                .clone()
                .or_else(|| template.location.clone()),
            all_day: overrides.all_day.unwrap_or(template.all_day),
            is_public: overrides.is_public.unwrap_or(template.is_public),
            is_registerable: overrides.is_registerable.unwrap_or(template.is_registerable),
            is_invite_only: overrides.is_invite_only.unwrap_or(template.is_invite_only),
        }
    }
}

/// An instance together with the template it inherits its details from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedInstance {
    pub instance: RecurringEventInstance,
    pub template: Event,
    pub details: InstanceDetails,
    pub has_exceptions: bool,
}

impl ResolvedInstance {
    fn assemble(
        instance: RecurringEventInstance,
        template: Event,
        exception: Option<&EventException>,
    ) -> Self {
        let overrides = exception.map(EventException::overrides).unwrap_or_default();
        Self {
            details: InstanceDetails::resolve(&template, &overrides),
            has_exceptions: exception.is_some(),
            instance,
            template,
        }
    }
}

/// Fields of a single-occurrence edit. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceUpdate {
    pub start_at: Option<DateTime<Utc>>,
    pub end_at: Option<DateTime<Utc>>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub all_day: Option<bool>,
    pub is_public: Option<bool>,
    pub is_registerable: Option<bool>,
    pub is_invite_only: Option<bool>,
}

impl InstanceUpdate {
    fn overrides(&self) -> EventOverrides {
        EventOverrides {
            name: self.name.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            all_day: self.all_day,
            is_public: self.is_public,
            is_registerable: self.is_registerable,
            is_invite_only: self.is_invite_only,
        }
    }

    fn changes_timing(&self) -> bool {
        self.start_at.is_some() || self.end_at.is_some()
    }

    /// ## Summary
    /// Rejects empty edits and blank names.
    ///
    /// ## Errors
    /// Returns `InvalidArguments` on `input` or `input.name`.
    fn validate(&self) -> ServiceResult<()> {
        if !self.changes_timing() && self.overrides().is_empty() {
            return Err(ServiceError::invalid_arguments(&["input"], NOTHING_TO_UPDATE));
        }
        if self.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
            return Err(ServiceError::invalid_arguments(
                &["input", "name"],
                "Name must not be empty",
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Computes the new schedule of an instance. Moving only the start keeps
/// the current duration.
///
/// ## Errors
/// Returns `InvalidArguments` on `endAt` if the result does not end after it starts.
fn rescheduled_window(
    current_start: DateTime<Utc>,
    current_end: DateTime<Utc>,
    start_at: Option<DateTime<Utc>>,
    end_at: Option<DateTime<Utc>>,
) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
    let (start, end) = match (start_at, end_at) {
        (Some(start), Some(end)) => (start, end),
        (Some(start), None) => (start, start + (current_end - current_start)),
        (None, Some(end)) => (current_start, end),
        (None, None) => (current_start, current_end),
    };
    let (start, end) = (truncate_to_seconds(start), truncate_to_seconds(end));

    if end <= start {
        return Err(ServiceError::invalid_arguments(
            &["input", "endAt"],
            "End time must be after start time",
        ));
    }
    Ok((start, end))
}

/// ## Summary
/// Rejects overrides that would leave the occurrence both public and invite-only.
///
/// ## Errors
/// Returns `InvalidArguments` on `input`.
fn ensure_consistent_visibility(template: &Event, overrides: &EventOverrides) -> ServiceResult<()> {
    let details = InstanceDetails::resolve(template, overrides);
    if details.is_public && details.is_invite_only {
        return Err(ServiceError::invalid_arguments(
            &["input"],
            "Event cannot be both Public and Invite-Only simultaneously.",
        ));
    }
    Ok(())
}

pub(crate) async fn load_instance(
    conn: &mut DbConnection<'_>,
    instance_id: Uuid,
) -> ServiceResult<RecurringEventInstance> {
    recurring_instance::by_id(instance_id)
        .select(RecurringEventInstance::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::not_found(INSTANCE_PATH, INSTANCE_NOT_FOUND))
}

pub(crate) async fn load_template(
    conn: &mut DbConnection<'_>,
    instance: &RecurringEventInstance,
    path: &[&str],
) -> ServiceResult<Event> {
    event::by_id(instance.base_recurring_event_id)
        .select(Event::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::not_found(path, EVENT_NOT_FOUND))
}

pub(crate) async fn load_exception(
    conn: &mut DbConnection<'_>,
    instance_id: Uuid,
) -> ServiceResult<Option<EventException>> {
    Ok(exception::by_instance(instance_id)
        .select(EventException::as_select())
        .first(conn)
        .await
        .optional()?)
}

/// ## Summary
/// Loads an instance with its template and overrides.
///
/// ## Errors
/// Returns `NotFound` if the instance or its template is missing.
#[tracing::instrument(skip(conn))]
pub async fn get_instance(
    conn: &mut DbConnection<'_>,
    instance_id: Uuid,
) -> ServiceResult<ResolvedInstance> {
    let instance = load_instance(conn, instance_id).await?;
    let template = load_template(conn, &instance, INSTANCE_PATH).await?;
    let exception = load_exception(conn, instance_id).await?;

    Ok(ResolvedInstance::assemble(instance, template, exception.as_ref()))
}

/// ## Summary
/// Edits one occurrence without touching the rest of its series: moves its
/// schedule and/or overrides template details for it alone.
///
/// Overrides merge with any earlier ones for the same instance.
///
/// ## Side Effects
/// Updates `actual_*` and `last_updated_at` on the instance and upserts its
/// `event_exception` row when details are given.
///
/// ## Errors
/// - `InvalidArguments` if no field is given, the name is blank, the new
///   window is empty, or the result is both public and invite-only.
/// - `NotFound` if the instance does not exist.
/// - `Unauthorized` unless the caller administers the organization or
///   created the template.
/// - `StateConflict` if the instance is cancelled.
#[tracing::instrument(skip(conn, authorizer, update), fields(caller = %caller.user_id))]
pub async fn update_single_instance(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    instance_id: Uuid,
    update: InstanceUpdate,
) -> ServiceResult<ResolvedInstance> {
    update.validate()?;

    let instance = load_instance(conn, instance_id).await?;
    let template = load_template(conn, &instance, INSTANCE_PATH).await?;
    authorizer
        .require_on_series(
            conn,
            caller,
            instance.organization_id,
            template.creator_id,
            Action::UpdateInstance,
            INSTANCE_PATH,
        )
        .await?;

    let (updated, stored, template) = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let current = recurring_instance::lock_by_id(tx, instance_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(INSTANCE_PATH, INSTANCE_NOT_FOUND))?;

                if current.is_cancelled {
                    return Err(ServiceError::state_conflict(INSTANCE_PATH, CANCELLED_INSTANCE));
                }

                let (start, end) = rescheduled_window(
                    current.actual_start_time,
                    current.actual_end_time,
                    update.start_at,
                    update.end_at,
                )?;

                let existing = load_exception(tx, instance_id).await?;
                let requested = update.overrides();
                let stored = if requested.is_empty() {
                    existing
                } else {
                    let below = existing
                        .as_ref()
                        .map(EventException::overrides)
                        .unwrap_or_default();
                    ensure_consistent_visibility(&template, &requested.clone().layered_over(below))?;

                    let row = NewEventException {
                        id: Uuid::now_v7(),
                        recurring_event_instance_id: instance_id,
                        organization_id: current.organization_id,
                        creator_id: Some(caller.user_id),
                        updater_id: Some(caller.user_id),
                        overrides: requested,
                    };
                    Some(exception::upsert(tx, &row).await?)
                };

                let updated = recurring_instance::reschedule(tx, instance_id, start, end).await?;
                Ok((updated, stored, template))
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(
        instance_id = %updated.id,
        actual_start_time = %updated.actual_start_time,
        actual_end_time = %updated.actual_end_time,
        has_exceptions = stored.is_some(),
        "Recurring instance updated"
    );
    Ok(ResolvedInstance::assemble(updated, template, stored.as_ref()))
}

/// ## Summary
/// Cancels one occurrence. The row stays materialized so regeneration does
/// not bring it back.
///
/// ## Errors
/// - `NotFound` if the instance does not exist, including when it is
///   deleted while the cancellation waits for its lock.
/// - `Unauthorized` if the caller is not an organization administrator.
/// - `StateConflict` if the instance is already cancelled.
#[tracing::instrument(skip(conn, authorizer), fields(caller = %caller.user_id))]
pub async fn cancel_single_instance(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    instance_id: Uuid,
) -> ServiceResult<RecurringEventInstance> {
    let instance = load_instance(conn, instance_id).await?;
    authorizer
        .require(
            conn,
            caller,
            instance.organization_id,
            None,
            Action::CancelInstance,
            INSTANCE_PATH,
        )
        .await?;

    let cancelled = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let current = recurring_instance::lock_by_id(tx, instance_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found(INSTANCE_PATH, INSTANCE_NOT_FOUND))?;

                if current.is_cancelled {
                    return Err(ServiceError::state_conflict(
                        INSTANCE_PATH,
                        "Recurring event instance is already cancelled.",
                    ));
                }

                Ok(recurring_instance::cancel(tx, instance_id).await?)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(instance_id = %cancelled.id, "Recurring instance cancelled");
    Ok(cancelled)
}
