use crate::{db::schema, model};
use diesel::{pg::Pg, prelude::*};

/// Attendance record binding a user to a standalone event or to one
/// recurring instance. Exactly one of the two references is set.
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
#[diesel(table_name = schema::event_attendee)]
#[diesel(check_for_backend(Pg))]
#[diesel(belongs_to(model::user::User, foreign_key = user_id))]
#[expect(clippy::struct_excessive_bools)]
pub struct EventAttendee {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub event_id: Option<uuid::Uuid>,
    pub recurring_event_instance_id: Option<uuid::Uuid>,
    pub is_invited: bool,
    pub is_registered: bool,
    pub is_checked_in: bool,
    pub is_checked_out: bool,
    pub checkin_time: Option<chrono::DateTime<chrono::Utc>>,
    pub checkout_time: Option<chrono::DateTime<chrono::Utc>>,
    pub feedback_submitted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::event_attendee)]
pub struct NewEventAttendee {
    pub id: uuid::Uuid,
    pub user_id: uuid::Uuid,
    pub event_id: Option<uuid::Uuid>,
    pub recurring_event_instance_id: Option<uuid::Uuid>,
    pub is_invited: bool,
    pub is_registered: bool,
}

/// Column values written by a single attendee state transition.
#[derive(Debug, Clone, PartialEq, Eq, AsChangeset)]
#[diesel(table_name = schema::event_attendee)]
#[diesel(treat_none_as_null = true)]
#[expect(clippy::struct_excessive_bools)]
pub struct AttendeeChangeset {
    pub is_invited: bool,
    pub is_registered: bool,
    pub is_checked_in: bool,
    pub is_checked_out: bool,
    pub checkin_time: Option<chrono::DateTime<chrono::Utc>>,
    pub checkout_time: Option<chrono::DateTime<chrono::Utc>>,
    pub feedback_submitted: bool,
}

impl From<&EventAttendee> for AttendeeChangeset {
    fn from(row: &EventAttendee) -> Self {
        Self {
            is_invited: row.is_invited,
            is_registered: row.is_registered,
            is_checked_in: row.is_checked_in,
            is_checked_out: row.is_checked_out,
            checkin_time: row.checkin_time,
            checkout_time: row.checkout_time,
            feedback_submitted: row.feedback_submitted,
        }
    }
}
