pub mod attendance;
pub mod auth;
pub mod error;
pub mod maintenance;
pub mod recurrence;
pub mod series;
