use chrono::{DateTime, Utc};
use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use serde::Serialize;
use uuid::Uuid;

use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{event, recurrence_rule, recurring_instance};
use cadence_db::model::event::Event;

use super::{LoadedSeries, TEMPLATE_PATH, load_series};
use crate::auth::{Action, Authorizer, Caller};
use crate::error::{ServiceError, ServiceResult};

const NOT_A_TEMPLATE_FOR_DELETE: &str = "Event is not a recurring event template. Use deleteEvent for standalone events or other delete mutations for instances.";

/// Pre-delete snapshot of a removed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[expect(clippy::struct_excessive_bools)]
pub struct DeletedTemplate {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub creator_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub all_day: bool,
    pub is_public: bool,
    pub is_registerable: bool,
    pub is_invite_only: bool,
    pub is_recurring_event_template: bool,
    /// Always empty; attachments live outside this service.
    pub attachments: Vec<String>,
    pub instances_deleted: usize,
}

impl DeletedTemplate {
    fn from_event(template: Event, instances_deleted: usize) -> Self {
        Self {
            id: template.id,
            organization_id: template.organization_id,
            creator_id: template.creator_id,
            name: template.name,
            description: template.description,
            location: template.location,
            start_at: template.start_at,
            end_at: template.end_at,
            all_day: template.all_day,
            is_public: template.is_public,
            is_registerable: template.is_registerable,
            is_invite_only: template.is_invite_only,
            is_recurring_event_template: template.is_recurring_event_template,
            attachments: Vec::new(),
            instances_deleted,
        }
    }
}

/// ## Summary
/// Deletes a recurring template together with its rule and every instance
/// of its series.
///
/// The rule row is locked for the whole cascade, so a concurrent horizon
/// extension either finishes first or loses its compare-and-swap.
///
/// ## Side Effects
/// Deletes instance rows (and, by cascade, their attendees), the rule and
/// the template event, all in one transaction.
///
/// ## Errors
/// - `NotFound` if the event is missing, is not a template, or has no rule.
/// - `InvalidArguments` if the rule has no original series id.
/// - `Unauthorized` if the caller is not an administrator of the organization.
/// - `Unexpected` if the template row was already gone when deleted.
#[tracing::instrument(skip(conn, authorizer), fields(template_id = %template_id, caller = %caller.user_id))]
pub async fn delete_entire_series(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    template_id: Uuid,
) -> ServiceResult<DeletedTemplate> {
    let LoadedSeries {
        template,
        rule,
        series_id,
    } = load_series(conn, template_id, NOT_A_TEMPLATE_FOR_DELETE).await?;

    authorizer
        .require(
            conn,
            caller,
            template.organization_id,
            None,
            Action::DeleteSeries,
            TEMPLATE_PATH,
        )
        .await?;

    let rule_id = rule.id;
    let instances_deleted = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                if recurrence_rule::lock_by_base_event(tx, template_id)
                    .await?
                    .is_none()
                {
                    return Err(ServiceError::Unexpected(format!(
                        "recurrence rule {rule_id} disappeared before deletion"
                    )));
                }

                let instances = recurring_instance::delete_by_series(tx, series_id).await?;
                recurrence_rule::delete_by_id(tx, rule_id).await?;

                if event::delete_by_id(tx, template_id).await? == 0 {
                    tracing::error!("Template row was already deleted");
                    return Err(ServiceError::Unexpected(format!(
                        "failed to delete recurring template {template_id}"
                    )));
                }

                Ok(instances)
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(
        series_id = %series_id,
        instances_deleted,
        "Recurring series deleted"
    );

    Ok(DeletedTemplate::from_event(template, instances_deleted))
}
