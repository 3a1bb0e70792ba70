//! Query composition for `recurring_event_instance`.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::recurring_event_instance;
use crate::model::recurrence::{NewRecurringEventInstance, RecurringEventInstance};

/// ## Summary
/// Returns a query selecting every materialized instance.
#[must_use]
pub fn all() -> recurring_event_instance::BoxedQuery<'static, diesel::pg::Pg> {
    recurring_event_instance::table.into_boxed()
}

/// ## Summary
/// Returns a query selecting an instance by id.
#[must_use]
pub fn by_id(id: Uuid) -> recurring_event_instance::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(recurring_event_instance::id.eq(id))
}

/// ## Summary
/// Returns a query selecting the instances of a template in series order.
#[must_use]
pub fn by_base_event(
    event_id: Uuid,
) -> recurring_event_instance::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(recurring_event_instance::base_recurring_event_id.eq(event_id))
        .order(recurring_event_instance::sequence_number.asc())
}

/// ## Summary
/// Returns a query selecting the instances of a template overlapping
/// `[range_start, range_end)`, ordered by sequence number.
#[must_use]
pub fn overlapping(
    event_id: Uuid,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
    include_cancelled: bool,
) -> recurring_event_instance::BoxedQuery<'static, diesel::pg::Pg> {
    let query = by_base_event(event_id)
        .filter(recurring_event_instance::actual_start_time.lt(range_end))
        .filter(recurring_event_instance::actual_end_time.gt(range_start));

    if include_cancelled {
        query
    } else {
        query.filter(recurring_event_instance::is_cancelled.eq(false))
    }
}

/// ## Summary
/// Inserts generated instances, skipping any whose identity key
/// `(base_recurring_event_id, original_instance_start_time)` already exists.
///
/// Returns the number of rows actually inserted.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_missing(
    conn: &mut DbConnection<'_>,
    instances: &[NewRecurringEventInstance],
) -> QueryResult<usize> {
    if instances.is_empty() {
        return Ok(0);
    }

    diesel::insert_into(recurring_event_instance::table)
        .values(instances)
        .on_conflict((
            recurring_event_instance::base_recurring_event_id,
            recurring_event_instance::original_instance_start_time,
        ))
        .do_nothing()
        .execute(conn)
        .await
}

/// ## Summary
/// Loads an instance and takes a row lock on it.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn lock_by_id(
    conn: &mut DbConnection<'_>,
    id: Uuid,
) -> QueryResult<Option<RecurringEventInstance>> {
    recurring_event_instance::table
        .filter(recurring_event_instance::id.eq(id))
        .select(RecurringEventInstance::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Writes a new actual schedule for one instance. The identity key is untouched.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn reschedule(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    actual_start_time: DateTime<Utc>,
    actual_end_time: DateTime<Utc>,
) -> QueryResult<RecurringEventInstance> {
    diesel::update(recurring_event_instance::table.filter(recurring_event_instance::id.eq(id)))
        .set((
            recurring_event_instance::actual_start_time.eq(actual_start_time),
            recurring_event_instance::actual_end_time.eq(actual_end_time),
            recurring_event_instance::last_updated_at.eq(diesel::dsl::now),
        ))
        .returning(RecurringEventInstance::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Marks an instance cancelled and returns the stored row.
///
/// Callers check the current state under [`lock_by_id`] first.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn cancel(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<RecurringEventInstance> {
    diesel::update(recurring_event_instance::table.filter(recurring_event_instance::id.eq(id)))
        .set((
            recurring_event_instance::is_cancelled.eq(true),
            recurring_event_instance::last_updated_at.eq(diesel::dsl::now),
        ))
        .returning(RecurringEventInstance::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Bumps `last_updated_at` on every instance of a series, marking them as
/// changed when shared template details change.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn touch_series(conn: &mut DbConnection<'_>, series_id: Uuid) -> QueryResult<usize> {
    diesel::update(
        recurring_event_instance::table
            .filter(recurring_event_instance::original_series_id.eq(series_id)),
    )
    .set(recurring_event_instance::last_updated_at.eq(diesel::dsl::now))
    .execute(conn)
    .await
}

/// ## Summary
/// Deletes every instance of a series and returns the number of rows removed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_by_series(conn: &mut DbConnection<'_>, series_id: Uuid) -> QueryResult<usize> {
    diesel::delete(
        recurring_event_instance::table
            .filter(recurring_event_instance::original_series_id.eq(series_id)),
    )
    .execute(conn)
    .await
}

/// ## Summary
/// Deletes instances of an organization that ended before `cutoff`.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_ended_before(
    conn: &mut DbConnection<'_>,
    organization_id: Uuid,
    cutoff: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::delete(
        recurring_event_instance::table
            .filter(recurring_event_instance::organization_id.eq(organization_id))
            .filter(recurring_event_instance::actual_end_time.lt(cutoff)),
    )
    .execute(conn)
    .await
}
