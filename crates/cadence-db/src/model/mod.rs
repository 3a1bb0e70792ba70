pub mod attendee;
pub mod event;
pub mod exception;
pub mod organization;
pub mod recurrence;
pub mod user;
