//! The attendee state machine.
//!
//! Transitions are pure: they take the current row and return the column
//! values to write, or the conflict that forbids the move. Callers hold the
//! row lock while applying the result.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cadence_db::model::attendee::{AttendeeChangeset, EventAttendee};

use crate::error::{ServiceError, ServiceResult};

const USER_PATH: &[&str] = &["input", "userId"];

pub(crate) const ALREADY_INVITED: &str = "User is already invited to this event";
pub(crate) const ALREADY_REGISTERED: &str = "User is already registered for this event";
pub(crate) const ALREADY_CHECKED_IN: &str = "User is already checked in to this event";
pub(crate) const NOT_CHECKED_IN: &str = "User is not checked in to this event";
pub(crate) const ALREADY_CHECKED_OUT: &str = "User is already checked out from this event";
pub(crate) const FEEDBACK_ALREADY_SUBMITTED: &str =
    "User has already submitted feedback for this event";

/// Furthest point an attendee has reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendeeState {
    Invited,
    Registered,
    CheckedIn,
    CheckedOut,
}

impl AttendeeState {
    #[must_use]
    pub const fn of(row: &EventAttendee) -> Self {
        if row.is_checked_out {
            Self::CheckedOut
        } else if row.is_checked_in {
            Self::CheckedIn
        } else if row.is_registered {
            Self::Registered
        } else {
            Self::Invited
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Invite,
    Register,
    CheckIn { at: DateTime<Utc> },
    CheckOut { at: DateTime<Utc> },
    SubmitFeedback,
}

impl Transition {
    /// ## Summary
    /// Computes the state columns after applying this transition to `row`.
    ///
    /// ## Errors
    /// Returns `StateConflict` on `["input", "userId"]` if the transition is
    /// not allowed from the row's current state. The row is never modified.
    pub fn apply(self, row: &EventAttendee) -> ServiceResult<AttendeeChangeset> {
        let mut next = AttendeeChangeset::from(row);

        match self {
            Self::Invite => {
                if row.is_invited {
                    return Err(conflict(ALREADY_INVITED));
                }
                if row.is_registered {
                    return Err(conflict(ALREADY_REGISTERED));
                }
                next.is_invited = true;
            }
            Self::Register => {
                if row.is_registered {
                    return Err(conflict(ALREADY_REGISTERED));
                }
                next.is_registered = true;
            }
            Self::CheckIn { at } => {
                if row.is_checked_in {
                    return Err(conflict(ALREADY_CHECKED_IN));
                }
                next.is_checked_in = true;
                next.checkin_time = Some(at);
            }
            Self::CheckOut { at } => {
                if !row.is_checked_in {
                    return Err(conflict(NOT_CHECKED_IN));
                }
                if row.is_checked_out {
                    return Err(conflict(ALREADY_CHECKED_OUT));
                }
                next.is_checked_out = true;
                next.checkout_time = Some(at);
            }
            Self::SubmitFeedback => {
                if !row.is_checked_in {
                    return Err(conflict(NOT_CHECKED_IN));
                }
                if row.feedback_submitted {
                    return Err(conflict(FEEDBACK_ALREADY_SUBMITTED));
                }
                next.feedback_submitted = true;
            }
        }

        Ok(next)
    }
}

fn conflict(message: &str) -> ServiceError {
    ServiceError::state_conflict(USER_PATH, message)
}
