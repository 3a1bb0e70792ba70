use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};

/// Per-occurrence overrides of the template's details.
///
/// Each `None` column inherits the template's value.
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
#[diesel(table_name = schema::event_exception)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(
    model::recurrence::RecurringEventInstance,
    foreign_key = recurring_event_instance_id
))]
pub struct EventException {
    pub id: uuid::Uuid,
    pub recurring_event_instance_id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub creator_id: Option<uuid::Uuid>,
    pub updater_id: Option<uuid::Uuid>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub all_day: Option<bool>,
    pub is_public: Option<bool>,
    pub is_registerable: Option<bool>,
    pub is_invite_only: Option<bool>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl EventException {
    #[must_use]
    pub fn overrides(&self) -> EventOverrides {
        EventOverrides {
            name: self.name.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
            all_day: self.all_day,
            is_public: self.is_public,
            is_registerable: self.is_registerable,
            is_invite_only: self.is_invite_only,
        }
    }
}

/// The template details one occurrence may override. As a changeset,
/// `None` fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = schema::event_exception)]
pub struct EventOverrides {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub all_day: Option<bool>,
    pub is_public: Option<bool>,
    pub is_registerable: Option<bool>,
    pub is_invite_only: Option<bool>,
}

impl EventOverrides {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Combines two sets of overrides; fields set on `self` win.
    #[must_use]
    pub fn layered_over(self, below: Self) -> Self {
        Self {
            name: self.name.or(below.name),
            description: self.description.or(below.description),
            location: self.location.or(below.location),
            all_day: self.all_day.or(below.all_day),
            is_public: self.is_public.or(below.is_public),
            is_registerable: self.is_registerable.or(below.is_registerable),
            is_invite_only: self.is_invite_only.or(below.is_invite_only),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::event_exception)]
pub struct NewEventException {
    pub id: uuid::Uuid,
    pub recurring_event_instance_id: uuid::Uuid,
    pub organization_id: uuid::Uuid,
    pub creator_id: Option<uuid::Uuid>,
    pub updater_id: Option<uuid::Uuid>,
    #[diesel(embed)]
    pub overrides: EventOverrides,
}
