use diesel_async::AsyncConnection;
use diesel_async::scoped_futures::ScopedFutureExt;
use serde::Deserialize;
use uuid::Uuid;

use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{event, recurrence_rule, recurring_instance};
use cadence_db::model::event::EventDetailsChangeset;
use cadence_db::model::recurrence::RecurrenceRule;

use super::RULE_NOT_FOUND;
use super::instance::{
    CANCELLED_INSTANCE, INSTANCE_PATH, NOTHING_TO_UPDATE, ResolvedInstance, get_instance,
    load_instance, load_template,
};
use crate::auth::{Action, Authorizer, Caller};
use crate::error::{ServiceError, ServiceResult};

/// Details shared by every occurrence of a series.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl SeriesUpdate {
    fn validate(&self) -> ServiceResult<()> {
        if self.name.is_none() && self.description.is_none() {
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

    fn changeset(&self) -> EventDetailsChangeset<'_> {
        EventDetailsChangeset {
            name: self.name.as_deref(),
            description: self.description.as_deref(),
        }
    }
}

/// ## Summary
/// Renames or re-describes a whole series, addressed through any one of its
/// instances. Every template sharing the series id is updated, including
/// templates split off by earlier edits.
///
/// ## Side Effects
/// Updates the templates and bumps `last_updated_at` on every instance of
/// the series, in one transaction. Per-instance overrides still win over
/// the new template values.
///
/// ## Errors
/// - `InvalidArguments` if no field is given or the name is blank.
/// - `NotFound` if the instance, its template or its rule is missing.
/// - `StateConflict` if the addressed instance is cancelled.
/// - `Unauthorized` unless the caller administers the organization or
///   created the template.
#[tracing::instrument(skip(conn, authorizer, update), fields(caller = %caller.user_id))]
pub async fn update_entire_series(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    caller: Caller,
    instance_id: Uuid,
    update: SeriesUpdate,
) -> ServiceResult<ResolvedInstance> {
    update.validate()?;

    let instance = load_instance(conn, instance_id).await?;
    if instance.is_cancelled {
        return Err(ServiceError::state_conflict(INSTANCE_PATH, CANCELLED_INSTANCE));
    }

    let template = load_template(conn, &instance, INSTANCE_PATH).await?;
    authorizer
        .require_on_series(
            conn,
            caller,
            instance.organization_id,
            template.creator_id,
            Action::UpdateSeries,
            INSTANCE_PATH,
        )
        .await?;

    let series_id = instance.original_series_id;
    let template_id = template.id;
    let (templates, instances) = conn
        .transaction::<_, ServiceError, _>(move |tx| {
            async move {
                if recurrence_rule::lock_by_base_event(tx, template_id)
                    .await?
                    .is_none_or(|rule: RecurrenceRule| rule.original_series_id != Some(series_id))
                {
                    return Err(ServiceError::not_found(INSTANCE_PATH, RULE_NOT_FOUND));
                }

                let changes = update.changeset();
                let templates =
                    event::update_series_templates(tx, series_id, &changes).await?;
                let instances = recurring_instance::touch_series(tx, series_id).await?;
                Ok((templates, instances))
            }
            .scope_boxed()
        })
        .await?;

    tracing::info!(
        series_id = %series_id,
        templates,
        instances,
        "Recurring series details updated"
    );

    get_instance(conn, instance_id).await
}
