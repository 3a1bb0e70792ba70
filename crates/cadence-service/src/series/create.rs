//! Creating a recurring template, its rule and the first window of instances.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cadence_core::config::MaterializationConfig;
use cadence_core::types::Frequency;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{event, organization, recurrence_rule, recurring_instance};
use cadence_db::model::event::{Event, NewEvent};
use cadence_db::model::organization::Organization;
use cadence_db::model::recurrence::{NewRecurrenceRule, RecurrenceRule};

use super::materialize::{instance_rows, to_db_count};
use crate::auth::{Action, Authorizer, Caller};
use crate::error::{ArgumentIssue, ServiceError, ServiceResult};
use crate::recurrence::{RecurrenceSpec, plan_initial, total_count};

/// Event fields of a new recurring template.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::struct_excessive_bools)]
pub struct TemplateFields {
    pub organization_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_registerable: bool,
    #[serde(default)]
    pub is_invite_only: bool,
}

/// Structured recurrence input. `start_date` defaults to the template's start.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceFields {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: i32,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: DateTime<Utc>,
}

const fn default_interval() -> i32 {
    1
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSeries {
    pub template: Event,
    pub rule: RecurrenceRule,
    pub instances_created: usize,
}

/// ## Summary
/// Validates the event half of a template before anything is generated.
///
/// ## Errors
/// Returns `InvalidArguments` listing every offending field.
fn validate_template(template: &TemplateFields) -> ServiceResult<()> {
    if template.name.trim().is_empty() {
        return Err(ServiceError::invalid_arguments(
            &["input", "name"],
            "Event name must not be empty",
        ));
    }

    if template.end_at <= template.start_at {
        return Err(ServiceError::invalid_arguments(
            &["input", "endAt"],
            "End time must be after start time",
        ));
    }

    if template.is_public && template.is_invite_only {
        let message = "An event cannot be both public and invite-only";
        return Err(ServiceError::InvalidArguments {
            message: message.to_string(),
            issues: vec![
                ArgumentIssue::at(&["input", "isPublic"]).with_message(message),
                ArgumentIssue::at(&["input", "isInviteOnly"]).with_message(message),
            ],
        });
    }

    Ok(())
}

/// ## Summary
/// Creates a recurring template with its rule and materializes the first
/// window of occurrences.
///
/// Validation, generation and authorization all happen before the
/// transaction opens; the template, rule and instances then commit together.
///
/// ## Side Effects
/// Inserts one `event`, one `recurrence_rule` and the initial instance rows.
///
/// ## Errors
/// - `InvalidArguments` for malformed event or recurrence fields.
/// - `NotFound` if the organization does not exist.
/// - `Unauthorized` if the caller may not create series in the organization.
#[tracing::instrument(
    skip(conn, authorizer, policy, template, recurrence),
    fields(caller = %caller.user_id, organization_id = %template.organization_id)
)]
pub async fn create_recurring_template(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    policy: &MaterializationConfig,
    caller: Caller,
    template: TemplateFields,
    recurrence: RecurrenceFields,
) -> ServiceResult<CreatedSeries> {
    validate_template(&template)?;

    let spec = RecurrenceSpec::for_template(
        recurrence.frequency,
        recurrence.interval,
        template.start_at,
        recurrence.start_date,
        recurrence.end_date,
    )?;
    let series_total = to_db_count(total_count(&spec)?)?;
    let plan = plan_initial(&spec, policy, Utc::now())?;
    let Some(last) = plan.last().copied() else {
        return Err(ServiceError::invalid_arguments(
            &["input", "recurrence"],
            "Recurrence produces no occurrences",
        ));
    };

    organization::by_id(template.organization_id)
        .select(Organization::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| {
            ServiceError::not_found(&["input", "organizationId"], "Organization not found.")
        })?;

    authorizer
        .require(
            conn,
            caller,
            template.organization_id,
            None,
            Action::CreateSeries,
            &["input", "organizationId"],
        )
        .await?;

    let rule_string = spec.rule_string();

    let created = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                let new_event = NewEvent::new(
                    template.organization_id,
                    &template.name,
                    template.start_at,
                    template.end_at,
                )
                .with_creator(caller.user_id)
                .with_details(template.description.as_deref(), template.location.as_deref())
                .all_day(template.all_day)
                .with_visibility(template.is_public, template.is_invite_only)
                .registerable(template.is_registerable)
                .as_recurring_template();
                let stored_event = event::insert(tx, &new_event).await?;

                let series_id = Uuid::now_v7();
                let new_rule = NewRecurrenceRule {
                    id: series_id,
                    base_recurring_event_id: stored_event.id,
                    original_series_id: Some(series_id),
                    organization_id: stored_event.organization_id,
                    creator_id: Some(caller.user_id),
                    frequency: spec.frequency.into(),
                    recurrence_interval: i32::from(spec.interval),
                    recurrence_start_date: spec.start,
                    recurrence_end_date: spec.end,
                    recurrence_rule_string: &rule_string,
                    latest_instance_date: last.start,
                    total_count: series_total,
                };
                let stored_rule = recurrence_rule::insert(tx, &new_rule).await?;

                let rows = instance_rows(&stored_event, &stored_rule, series_id, &plan)?;
                let instances_created = recurring_instance::insert_missing(tx, &rows).await?;

                Ok(CreatedSeries {
                    template: stored_event,
                    rule: stored_rule,
                    instances_created,
                })
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(
        template_id = %created.template.id,
        rule_id = %created.rule.id,
        total_count = created.rule.total_count,
        instances_created = created.instances_created,
        "Recurring series created"
    );

    Ok(created)
}
