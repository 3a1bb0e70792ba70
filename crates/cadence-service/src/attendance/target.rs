use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Serialize;
use uuid::Uuid;

use cadence_db::db::connection::DbConnection;
use cadence_db::db::query::{attendee, event, recurring_instance};
use cadence_db::db::schema::event_attendee;
use cadence_db::model::attendee::EventAttendee;
use cadence_db::model::event::Event;
use cadence_db::model::recurrence::RecurringEventInstance;

use crate::error::{ArgumentIssue, ServiceError, ServiceResult};
use crate::series::instance::{InstanceDetails, load_exception};

const EVENT_PATH: &[&str] = &["input", "eventId"];
const INSTANCE_PATH: &[&str] = &["input", "recurringEventInstanceId"];

/// What an attendance operation applies to: a standalone event or exactly
/// one materialized instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum AttendanceTarget {
    Event(Uuid),
    Instance(Uuid),
}

impl AttendanceTarget {
    /// ## Summary
    /// Builds the target from the two optional input ids.
    ///
    /// ## Errors
    /// Returns `InvalidArguments` on both paths if both or neither are set.
    pub fn from_ids(
        event_id: Option<Uuid>,
        recurring_event_instance_id: Option<Uuid>,
    ) -> ServiceResult<Self> {
        match (event_id, recurring_event_instance_id) {
            (Some(id), None) => Ok(Self::Event(id)),
            (None, Some(id)) => Ok(Self::Instance(id)),
            _ => {
                let message =
                    "Either eventId or recurringEventInstanceId must be provided, but not both";
                Err(ServiceError::InvalidArguments {
                    message: message.to_string(),
                    issues: vec![
                        ArgumentIssue::at(EVENT_PATH).with_message(message),
                        ArgumentIssue::at(INSTANCE_PATH).with_message(message),
                    ],
                })
            }
        }
    }

    /// Input path naming this target in error reports.
    #[must_use]
    pub const fn argument_path(self) -> &'static [&'static str] {
        match self {
            Self::Event(_) => EVENT_PATH,
            Self::Instance(_) => INSTANCE_PATH,
        }
    }

    #[must_use]
    pub const fn event_id(self) -> Option<Uuid> {
        match self {
            Self::Event(id) => Some(id),
            Self::Instance(_) => None,
        }
    }

    #[must_use]
    pub const fn instance_id(self) -> Option<Uuid> {
        match self {
            Self::Event(_) => None,
            Self::Instance(id) => Some(id),
        }
    }

    /// Query selecting one user's record on this target.
    #[must_use]
    pub fn attendee_query(
        self,
        user_id: Uuid,
    ) -> event_attendee::BoxedQuery<'static, diesel::pg::Pg> {
        match self {
            Self::Event(id) => attendee::by_user_and_event(user_id, id),
            Self::Instance(id) => attendee::by_user_and_instance(user_id, id),
        }
    }

    /// Query selecting every record on this target.
    #[must_use]
    pub fn attendees_query(
        self,
    ) -> event_attendee::BoxedQuery<'static, diesel::pg::Pg> {
        match self {
            Self::Event(id) => attendee::for_event(id),
            Self::Instance(id) => attendee::for_instance(id),
        }
    }

    /// ## Summary
    /// Loads one user's record on this target under a row lock.
    ///
    /// ## Errors
    /// Returns an error if the database operation fails.
    pub async fn lock_attendee(
        self,
        conn: &mut DbConnection<'_>,
        user_id: Uuid,
    ) -> QueryResult<Option<EventAttendee>> {
        match self {
            Self::Event(id) => attendee::lock_for_event(conn, user_id, id).await,
            Self::Instance(id) => attendee::lock_for_instance(conn, user_id, id).await,
        }
    }
}

/// A target that exists, with the properties attendance rules depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub target: AttendanceTarget,
    pub organization_id: Uuid,
    pub is_registerable: bool,
    pub is_invite_only: bool,
    pub is_cancelled: bool,
}

impl ResolvedTarget {
    /// ## Summary
    /// Rejects new attendance on a cancelled instance.
    ///
    /// ## Errors
    /// Returns `StateConflict` if the target is cancelled.
    pub fn ensure_open(&self) -> ServiceResult<()> {
        if self.is_cancelled {
            return Err(ServiceError::state_conflict(
                self.target.argument_path(),
                "Recurring event instance is cancelled",
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Checks that the target exists and loads its organization and
/// registration flags. Instances inherit flags from their template.
///
/// ## Errors
/// - `NotFound` on the target's path if it does not exist.
/// - `StateConflict` if an event target is a recurring template.
#[tracing::instrument(skip(conn))]
pub async fn resolve_target(
    conn: &mut DbConnection<'_>,
    target: AttendanceTarget,
) -> ServiceResult<ResolvedTarget> {
    match target {
        AttendanceTarget::Event(id) => {
            let standalone = load_event(conn, id, EVENT_PATH).await?;
            if standalone.is_recurring_event_template {
                return Err(ServiceError::state_conflict(
                    EVENT_PATH,
                    "Recurring event templates cannot be attended; use recurringEventInstanceId",
                ));
            }
            Ok(ResolvedTarget {
                target,
                organization_id: standalone.organization_id,
                is_registerable: standalone.is_registerable,
                is_invite_only: standalone.is_invite_only,
                is_cancelled: false,
            })
        }
        AttendanceTarget::Instance(id) => {
            let instance = recurring_instance::by_id(id)
                .select(RecurringEventInstance::as_select())
                .first(conn)
                .await
                .optional()?
                .ok_or_else(|| {
                    ServiceError::not_found(INSTANCE_PATH, "Recurring event instance not found.")
                })?;
            let template = load_event(conn, instance.base_recurring_event_id, INSTANCE_PATH).await?;
            let overrides = load_exception(conn, id)
                .await?
                .map(|exception| exception.overrides())
                .unwrap_or_default();
            let details = InstanceDetails::resolve(&template, &overrides);
            Ok(ResolvedTarget {
                target,
                organization_id: instance.organization_id,
                is_registerable: details.is_registerable,
                is_invite_only: details.is_invite_only,
                is_cancelled: instance.is_cancelled,
            })
        }
    }
}

async fn load_event(
    conn: &mut DbConnection<'_>,
    id: Uuid,
    path: &[&str],
) -> ServiceResult<Event> {
    event::by_id(id)
        .select(Event::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| ServiceError::not_found(path, "Event not found."))
}
