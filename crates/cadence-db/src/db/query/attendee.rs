//! Query composition for `event_attendee`.
//!
//! Attendee rows reference either `event_id` or `recurring_event_instance_id`;
//! callers pick the builder that matches the target they resolved.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_attendee;
use crate::model::attendee::{AttendeeChangeset, EventAttendee, NewEventAttendee};

/// ## Summary
/// Returns a query selecting every attendee row.
#[must_use]
pub fn all() -> event_attendee::BoxedQuery<'static, diesel::pg::Pg> {
    event_attendee::table.into_boxed()
}

/// ## Summary
/// Returns a query selecting the attendees of a standalone event.
#[must_use]
pub fn for_event(event_id: Uuid) -> event_attendee::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event_attendee::event_id.eq(event_id))
        .order(event_attendee::created_at.asc())
}

/// ## Summary
/// Returns a query selecting the attendees of a recurring instance.
#[must_use]
pub fn for_instance(instance_id: Uuid) -> event_attendee::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event_attendee::recurring_event_instance_id.eq(instance_id))
        .order(event_attendee::created_at.asc())
}

/// ## Summary
/// Returns a query selecting one user's record on a standalone event.
#[must_use]
pub fn by_user_and_event(
    user_id: Uuid,
    event_id: Uuid,
) -> event_attendee::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event_attendee::user_id.eq(user_id))
        .filter(event_attendee::event_id.eq(event_id))
}

/// ## Summary
/// Returns a query selecting one user's record on a recurring instance.
#[must_use]
pub fn by_user_and_instance(
    user_id: Uuid,
    instance_id: Uuid,
) -> event_attendee::BoxedQuery<'static, diesel::pg::Pg> {
    all()
        .filter(event_attendee::user_id.eq(user_id))
        .filter(event_attendee::recurring_event_instance_id.eq(instance_id))
}

/// ## Summary
/// Loads one user's record on a standalone event under a row lock.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn lock_for_event(
    conn: &mut DbConnection<'_>,
    user_id: Uuid,
    event_id: Uuid,
) -> QueryResult<Option<EventAttendee>> {
    event_attendee::table
        .filter(event_attendee::user_id.eq(user_id))
        .filter(event_attendee::event_id.eq(event_id))
        .select(EventAttendee::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Loads one user's record on a recurring instance under a row lock.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn lock_for_instance(
    conn: &mut DbConnection<'_>,
    user_id: Uuid,
    instance_id: Uuid,
) -> QueryResult<Option<EventAttendee>> {
    event_attendee::table
        .filter(event_attendee::user_id.eq(user_id))
        .filter(event_attendee::recurring_event_instance_id.eq(instance_id))
        .select(EventAttendee::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()
}

/// ## Summary
/// Inserts an attendee row and returns it.
///
/// ## Errors
/// Returns an error if the database operation fails, including a unique
/// violation when the user already has a record on the target.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    attendee: &NewEventAttendee,
) -> QueryResult<EventAttendee> {
    diesel::insert_into(event_attendee::table)
        .values(attendee)
        .returning(EventAttendee::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Writes the state columns of one attendee row and returns the updated row.
///
/// ## Errors
/// Returns an error if the database operation fails or the row no longer exists.
pub async fn apply(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    changes: &AttendeeChangeset,
) -> QueryResult<EventAttendee> {
    diesel::update(event_attendee::table.filter(event_attendee::id.eq(id)))
        .set(changes)
        .returning(EventAttendee::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Deletes an attendee row by id and returns the number of rows removed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_by_id(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(event_attendee::table.filter(event_attendee::id.eq(id)))
        .execute(conn)
        .await
}
