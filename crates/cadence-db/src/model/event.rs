use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};

/// A standalone event, or the template row of a recurring series.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Queryable,
    Selectable,
    Identifiable,
    Associations,
    serde::Serialize,
)]
#[diesel(table_name = schema::event)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::organization::Organization, foreign_key = organization_id))]
#[expect(clippy::struct_excessive_bools)]
pub struct Event {
    pub id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub creator_id: Option<uuid::Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_at: chrono::DateTime<chrono::Utc>,
    pub end_at: chrono::DateTime<chrono::Utc>,
    pub all_day: bool,
    pub is_public: bool,
    pub is_registerable: bool,
    pub is_invite_only: bool,
    pub is_recurring_event_template: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Event {
    /// Duration applied to every occurrence generated from this template.
    #[must_use]
    pub fn duration(&self) -> chrono::TimeDelta {
        self.end_at - self.start_at
    }
}

/// Details shared by every template of a series. `None` leaves a column as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = schema::event)]
pub struct EventDetailsChangeset<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::event)]
#[expect(clippy::struct_excessive_bools)]
pub struct NewEvent<'a> {
    pub id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub creator_id: Option<uuid::Uuid>,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub location: Option<&'a str>,
    pub start_at: chrono::DateTime<chrono::Utc>,
    pub end_at: chrono::DateTime<chrono::Utc>,
    pub all_day: bool,
    pub is_public: bool,
    pub is_registerable: bool,
    pub is_invite_only: bool,
    pub is_recurring_event_template: bool,
}

impl<'a> NewEvent<'a> {
    #[must_use]
    pub fn new(
        organization_id: uuid::Uuid,
        name: &'a str,
        start_at: chrono::DateTime<chrono::Utc>,
        end_at: chrono::DateTime<chrono::Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::now_v7(),
            organization_id,
            creator_id: None,
            name,
            description: None,
            location: None,
            start_at,
            end_at,
            all_day: false,
            is_public: false,
            is_registerable: false,
            is_invite_only: false,
            is_recurring_event_template: false,
        }
    }

    #[must_use]
    pub fn with_creator(mut self, creator_id: uuid::Uuid) -> Self {
        self.creator_id = Some(creator_id);
        self
    }

    #[must_use]
    pub fn with_details(mut self, description: Option<&'a str>, location: Option<&'a str>) -> Self {
        self.description = description;
        self.location = location;
        self
    }

    #[must_use]
    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    #[must_use]
    pub fn with_visibility(mut self, is_public: bool, is_invite_only: bool) -> Self {
        self.is_public = is_public;
        self.is_invite_only = is_invite_only;
        self
    }

    #[must_use]
    pub fn registerable(mut self, is_registerable: bool) -> Self {
        self.is_registerable = is_registerable;
        self
    }

    #[must_use]
    pub fn as_recurring_template(mut self) -> Self {
        self.is_recurring_event_template = true;
        self
    }
}
