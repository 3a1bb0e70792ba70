//! Cadence recurring event service - integration test support.
//!
//! Re-exports the workspace crates so integration tests import everything
//! from one root.

pub use cadence_app as app;
pub use cadence_core::{config, constants, types};
pub use cadence_db as db;
pub use cadence_service as service;
