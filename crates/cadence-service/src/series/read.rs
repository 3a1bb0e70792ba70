use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use cadence_core::config::MaterializationConfig;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::recurring_instance;
use cadence_db::model::recurrence::RecurringEventInstance;

use super::materialize::extend_until;
use super::{NOT_A_TEMPLATE, load_series};
use crate::error::{ServiceError, ServiceResult};
use crate::recurrence::{RecurrenceSpec, extension_target};

/// ## Summary
/// Lists the instances of a series overlapping `[range_start, range_end)`,
/// ordered by sequence number.
///
/// When the range reaches within the extension threshold of the horizon,
/// the horizon is extended synchronously first.
///
/// ## Side Effects
/// May insert instance rows and advance the rule's horizon.
///
/// ## Errors
/// - `InvalidArguments` if the range is empty.
/// - `NotFound`/`InvalidArguments` from series loading.
#[tracing::instrument(skip(conn, policy), fields(template_id = %template_id))]
pub async fn list_instances(
    conn: &mut DbConnection<'_>,
    policy: &MaterializationConfig,
    template_id: Uuid,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    include_cancelled: bool,
) -> ServiceResult<Vec<RecurringEventInstance>> {
    if range_end <= range_start {
        return Err(ServiceError::invalid_arguments(
            &["input", "rangeEnd"],
            "Range end must be after range start",
        ));
    }

    let loaded = load_series(conn, template_id, NOT_A_TEMPLATE).await?;
    let spec = RecurrenceSpec::from_rule(&loaded.rule)?;

    if let Some(target) =
        extension_target(&spec, loaded.rule.latest_instance_date, range_end, policy)?
    {
        let inserted = extend_until(conn, policy, template_id, target).await?;
        tracing::debug!(inserted, target = %target, "Extended horizon before read");
    }

    let instances = recurring_instance::overlapping(
        template_id,
        range_start,
        range_end,
        include_cancelled,
    )
    .select(RecurringEventInstance::as_select())
    .load(conn)
    .await?;

    Ok(instances)
}
