//! Recurring series lifecycle: creation, horizon extension, series-wide
//! edits, deletion and per-occurrence edits.

pub mod create;
pub mod delete;
pub mod instance;
pub mod materialize;
pub mod read;
pub mod update;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{event, recurrence_rule};
use cadence_db::model::event::Event;
use cadence_db::model::recurrence::RecurrenceRule;

use crate::error::{ServiceError, ServiceResult};

pub use create::{CreatedSeries, RecurrenceFields, TemplateFields, create_recurring_template};
pub use delete::{DeletedTemplate, delete_entire_series};
pub use instance::{
    InstanceDetails, InstanceUpdate, ResolvedInstance, cancel_single_instance, get_instance,
    update_single_instance,
};
pub use materialize::{
    ExtensionOutcome, extend_horizon, extend_series, extend_until, materialize_due_series,
};
pub use read::list_instances;
pub use update::{SeriesUpdate, update_entire_series};

pub(crate) const EVENT_NOT_FOUND: &str = "Event not found.";
pub(crate) const NOT_A_TEMPLATE: &str = "Event is not a recurring event template.";
pub(crate) const RULE_NOT_FOUND: &str =
    "No recurrence rule found for this recurring event template.";
pub(crate) const SERIES_ID_MISSING: &str = "Recurrence rule missing original series ID.";

const TEMPLATE_PATH: &[&str] = &["input", "id"];

/// A template together with its rule and series identity.
#[derive(Debug, Clone)]
pub(crate) struct LoadedSeries {
    pub template: Event,
    pub rule: RecurrenceRule,
    pub series_id: Uuid,
}

/// ## Summary
/// Loads a recurring template, its rule and its series identity, rejecting
/// standalone events and rules without a series id.
///
/// ## Errors
/// - `NotFound` if the event is missing, is not a template, or has no rule.
/// - `InvalidArguments` if the rule has no original series id.
pub(crate) async fn load_series(
    conn: &mut DbConnection<'_>,
    template_id: Uuid,
    not_a_template: &str,
) -> ServiceResult<LoadedSeries> {
    let template = event::by_id(template_id)
        .select(Event::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::not_found(TEMPLATE_PATH, EVENT_NOT_FOUND))?;

    if !template.is_recurring_event_template {
        return Err(ServiceError::not_found(TEMPLATE_PATH, not_a_template));
    }

    let rule = recurrence_rule::by_base_event(template_id)
        .select(RecurrenceRule::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| {
            tracing::error!(template_id = %template_id, "Recurring template has no recurrence rule");
            ServiceError::not_found(TEMPLATE_PATH, RULE_NOT_FOUND)
        })?;

    let Some(series_id) = rule.original_series_id else {
        tracing::error!(rule_id = %rule.id, "Recurrence rule has no original series id");
        return Err(ServiceError::invalid_arguments(
            TEMPLATE_PATH,
            SERIES_ID_MISSING,
        ));
    };

    Ok(LoadedSeries {
        template,
        rule,
        series_id,
    })
}
