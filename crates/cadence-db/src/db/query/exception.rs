//! Query composition for `event_exception`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::event_exception;
use crate::model::exception::{EventException, NewEventException};

/// ## Summary
/// Returns a query selecting the overrides of one instance.
#[must_use]
pub fn by_instance(instance_id: Uuid) -> event_exception::BoxedQuery<'static, diesel::pg::Pg> {
    event_exception::table
        .into_boxed()
        .filter(event_exception::recurring_event_instance_id.eq(instance_id))
}

/// ## Summary
/// Stores overrides for an instance. When the instance already has a row,
/// only the fields set on `exception.overrides` are replaced.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn upsert(
    conn: &mut DbConnection<'_>,
    exception: &NewEventException,
) -> QueryResult<EventException> {
    diesel::insert_into(event_exception::table)
        .values(exception)
        .on_conflict(event_exception::recurring_event_instance_id)
        .do_update()
        .set((
            &exception.overrides,
            event_exception::updater_id.eq(exception.updater_id),
        ))
        .returning(EventException::as_returning())
        .get_result(conn)
        .await
}
