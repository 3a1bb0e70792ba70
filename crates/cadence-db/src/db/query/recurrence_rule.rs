//! Query composition for `recurrence_rule`.
//!
//! The rule row is the serialization point for horizon extension: advancing
//! `latest_instance_date` is a compare-and-swap on `version`, and whole-series
//! deletion holds a row lock on the rule for the duration of the cascade.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::recurrence_rule;
use crate::model::recurrence::{NewRecurrenceRule, RecurrenceRule};

/// ## Summary
/// Returns a query selecting every recurrence rule.
#[must_use]
pub fn all() -> recurrence_rule::BoxedQuery<'static, diesel::pg::Pg> {
    recurrence_rule::table.into_boxed()
}

/// ## Summary
/// Returns a query selecting a rule by id.
#[must_use]
pub fn by_id(id: Uuid) -> recurrence_rule::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(recurrence_rule::id.eq(id))
}

/// ## Summary
/// Returns a query selecting the rule owned by a template event.
#[must_use]
pub fn by_base_event(event_id: Uuid) -> recurrence_rule::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(recurrence_rule::base_recurring_event_id.eq(event_id))
}

/// ## Summary
/// Returns a query selecting rules whose horizon is behind `cutoff` and that
/// still have occurrences left to materialize.
#[must_use]
pub fn due_for_extension(
    cutoff: DateTime<Utc>,
) -> recurrence_rule::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(recurrence_rule::latest_instance_date.lt(cutoff))
        .filter(recurrence_rule::latest_instance_date.lt(recurrence_rule::recurrence_end_date))
        .order(recurrence_rule::latest_instance_date.asc())
}

/// ## Summary
/// Inserts a recurrence rule and returns the stored row.
///
/// ## Errors
/// Returns an error if the database operation fails, including a unique
/// violation when the template already owns a rule.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    rule: &NewRecurrenceRule<'_>,
) -> QueryResult<RecurrenceRule> {
    diesel::insert_into(recurrence_rule::table)
        .values(rule)
        .returning(RecurrenceRule::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Loads the rule owned by a template and takes a row lock on it.
///
/// ## Side Effects
/// Holds `FOR UPDATE` on the rule row until the surrounding transaction ends.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn lock_by_base_event(
    conn: &mut DbConnection<'_>,
    event_id: Uuid,
) -> QueryResult<Option<RecurrenceRule>> {
    recurrence_rule::table
        .filter(recurrence_rule::base_recurring_event_id.eq(event_id))
        .select(RecurrenceRule::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Advances the materialization horizon if the rule is still at
/// `expected_version`.
///
/// Returns the number of rows updated: `1` when this caller won, `0` when
/// another writer advanced (or deleted) the rule first.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn advance_horizon(
    conn: &mut DbConnection<'_>,
    rule_id: Uuid,
    expected_version: i64,
    latest_instance_date: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::update(
        recurrence_rule::table
            .filter(recurrence_rule::id.eq(rule_id))
            .filter(recurrence_rule::version.eq(expected_version)),
    )
    .set((
        recurrence_rule::latest_instance_date.eq(latest_instance_date),
        recurrence_rule::version.eq(recurrence_rule::version + 1),
    ))
    .execute(conn)
    .await
}

/// ## Summary
/// Deletes a rule by id and returns the number of rows removed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_by_id(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(recurrence_rule::table.filter(recurrence_rule::id.eq(id)))
        .execute(conn)
        .await
}
