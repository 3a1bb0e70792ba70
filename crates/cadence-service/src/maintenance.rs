//! Retention of past occurrences.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use cadence_core::config::MaterializationConfig;
use cadence_core::util::time::sub_months_saturating;
use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{organization, recurring_instance};
use cadence_db::model::organization::Organization;

use crate::auth::{Action, Authorizer, Caller};
use crate::error::{ServiceError, ServiceResult};

/// Instances ending before this instant are past the retention window.
#[must_use]
pub fn retention_cutoff(now: DateTime<Utc>, policy: &MaterializationConfig) -> DateTime<Utc> {
    sub_months_saturating(now, policy.history_retention_months)
}

/// ## Summary
/// Deletes an organization's instances that ended before the retention
/// cutoff and returns how many were removed.
///
/// Rules and horizons are left alone, so regeneration never brings the
/// removed occurrences back.
///
/// ## Side Effects
/// Deletes instance rows and, by cascade, their attendee rows.
///
/// ## Errors
/// - `NotFound` if the organization does not exist.
/// - `Unauthorized` unless the caller administers the organization.
#[tracing::instrument(skip(conn, authorizer, policy), fields(caller = %caller.user_id))]
pub async fn cleanup_expired_instances(
    conn: &mut DbConnection<'_>,
    authorizer: &Authorizer,
    policy: &MaterializationConfig,
    caller: Caller,
    organization_id: Uuid,
    now: DateTime<Utc>,
) -> ServiceResult<usize> {
    organization::by_id(organization_id)
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
            organization_id,
            None,
            Action::CleanupHistory,
            &["input", "organizationId"],
        )
        .await?;

    let cutoff = retention_cutoff(now, policy);
    let deleted = recurring_instance::delete_ended_before(conn, organization_id, cutoff).await?;

    tracing::info!(deleted, cutoff = %cutoff, "Expired recurring instances removed");
    Ok(deleted)
}
