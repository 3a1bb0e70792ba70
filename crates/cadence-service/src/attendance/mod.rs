//! Attendance records bound to a standalone event or one recurring instance.

pub mod binder;
pub mod state;
pub mod target;

pub use binder::{
    check_in, check_out, has_submitted_feedback, invite_attendee, list_attendees,
    register_for_event, remove_attendee, resolve_attendee, submit_feedback,
};
pub use state::{AttendeeState, Transition};
pub use target::{AttendanceTarget, ResolvedTarget, resolve_target};
