//! Role-based authorization for series and attendance operations.

pub mod authorizer;
pub mod casbin;
pub mod subject;

pub use authorizer::Authorizer;
pub use subject::{Action, Caller, Subject};
