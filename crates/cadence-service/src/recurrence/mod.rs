//! Recurrence rules and deterministic occurrence generation.
//!
//! Everything in this module is pure: no I/O, no clock reads. Callers pass
//! `now` explicitly so the same inputs always yield the same occurrences.

pub mod generator;
pub mod horizon;
pub mod rule;

pub use generator::{Occurrence, occurrences, total_count};
pub use horizon::{extension_target, plan_extension, plan_initial};
pub use rule::RecurrenceSpec;
