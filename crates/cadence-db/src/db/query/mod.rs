pub mod attendee;
pub mod event;
pub mod exception;
pub mod organization;
pub mod recurrence_rule;
pub mod recurring_instance;
pub mod user;
