use crate::{
    db::{enums::MembershipRole, schema},
    model,
};
use diesel::{pg::Pg, prelude::*};

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Identifiable, serde::Serialize)]
#[diesel(table_name = schema::organization)]
#[diesel(check_for_backend(Pg))]
pub struct Organization {
    pub id: uuid::Uuid,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::organization)]
pub struct NewOrganization<'a> {
    pub id: uuid::Uuid,
    pub name: &'a str,
}

impl<'a> NewOrganization<'a> {
    #[must_use]
    pub fn new(name: &'a str) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = schema::organization_membership)]
#[diesel(check_for_backend(Pg))]
#[diesel(primary_key(organization_id, member_id))]
#[diesel(belongs_to(Organization, foreign_key = organization_id))]
#[diesel(belongs_to(model::user::User, foreign_key = member_id))]
pub struct Membership {
    pub organization_id: uuid::Uuid,
    pub member_id: uuid::Uuid,
    pub role: MembershipRole,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::organization_membership)]
pub struct NewMembership {
    pub organization_id: uuid::Uuid,
    pub member_id: uuid::Uuid,
    pub role: MembershipRole,
}
