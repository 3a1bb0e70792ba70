//! Query composition for `app_user`.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::app_user;
use crate::model::user::{NewUser, User};

/// ## Summary
/// Returns a query selecting a user by id.
#[must_use]
pub fn by_id(id: Uuid) -> app_user::BoxedQuery<'static, diesel::pg::Pg> {
    app_user::table.filter(app_user::id.eq(id)).into_boxed()
}

/// ## Summary
/// Returns a query selecting a user by email address.
#[must_use]
pub fn by_email(email: &str) -> app_user::BoxedQuery<'_, diesel::pg::Pg> {
    app_user::table.filter(app_user::email.eq(email)).into_boxed()
}

/// ## Summary
/// Inserts a user and returns it.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(conn: &mut DbConnection<'_>, new_user: &NewUser<'_>) -> QueryResult<User> {
    diesel::insert_into(app_user::table)
        .values(new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .await
}
