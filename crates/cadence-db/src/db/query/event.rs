//! Query composition for `event` rows, standalone and template.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::{event, recurrence_rule};
use crate::model::event::{Event, EventDetailsChangeset, NewEvent};

/// ## Summary
/// Returns a query selecting every event.
#[must_use]
pub fn all() -> event::BoxedQuery<'static, diesel::pg::Pg> {
    event::table.into_boxed()
}

/// ## Summary
/// Returns a query selecting an event by id.
#[must_use]
pub fn by_id(id: Uuid) -> event::BoxedQuery<'static, diesel::pg::Pg> {
    all().filter(event::id.eq(id))
}

/// ## Summary
/// Inserts an event and returns the stored row.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(conn: &mut DbConnection<'_>, new_event: &NewEvent<'_>) -> QueryResult<Event> {
    diesel::insert_into(event::table)
        .values(new_event)
        .returning(Event::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Applies new details to every template whose rule belongs to the series.
///
/// Returns the number of templates updated.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn update_series_templates(
    conn: &mut DbConnection<'_>,
    series_id: Uuid,
    changes: &EventDetailsChangeset<'_>,
) -> QueryResult<usize> {
    let templates = recurrence_rule::table
        .filter(recurrence_rule::original_series_id.eq(series_id))
        .select(recurrence_rule::base_recurring_event_id);

    diesel::update(event::table.filter(event::id.eq_any(templates)))
        .set(changes)
        .execute(conn)
        .await
}

/// ## Summary
/// Deletes an event by id and returns the number of rows removed.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn delete_by_id(conn: &mut DbConnection<'_>, id: Uuid) -> QueryResult<usize> {
    diesel::delete(event::table.filter(event::id.eq(id)))
        .execute(conn)
        .await
}
