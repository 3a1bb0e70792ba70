//! Query composition for organizations and their memberships.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::db::connection::DbConnection;
use crate::db::schema::{organization, organization_membership};
use crate::model::organization::{Membership, NewMembership, NewOrganization, Organization};

/// ## Summary
/// Returns a query selecting an organization by id.
#[must_use]
pub fn by_id(id: Uuid) -> organization::BoxedQuery<'static, diesel::pg::Pg> {
    organization::table
        .filter(organization::id.eq(id))
        .into_boxed()
}

/// ## Summary
/// Returns a query selecting a user's membership in an organization.
#[must_use]
pub fn membership(
    organization_id: Uuid,
    member_id: Uuid,
) -> organization_membership::BoxedQuery<'static, diesel::pg::Pg> {
    organization_membership::table
        .filter(organization_membership::organization_id.eq(organization_id))
        .filter(organization_membership::member_id.eq(member_id))
        .into_boxed()
}

/// ## Summary
/// Inserts an organization and returns it.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert(
    conn: &mut DbConnection<'_>,
    new_org: &NewOrganization<'_>,
) -> QueryResult<Organization> {
    diesel::insert_into(organization::table)
        .values(new_org)
        .returning(Organization::as_returning())
        .get_result(conn)
        .await
}

/// ## Summary
/// Inserts a membership and returns it.
///
/// ## Errors
/// Returns an error if the database operation fails.
pub async fn insert_membership(
    conn: &mut DbConnection<'_>,
    new_membership: &NewMembership,
) -> QueryResult<Membership> {
    diesel::insert_into(organization_membership::table)
        .values(new_membership)
        .returning(Membership::as_returning())
        .get_result(conn)
        .await
}
