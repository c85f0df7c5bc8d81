//! Angel tools module.
//!
//! - `existence`: whether angels exist (stubbed upstream, always affirmative)
//! - `details`: description of an angel category from a fixed table

pub mod common;
pub mod details;
pub mod existence;

pub use details::{AngelDetailsParams, AngelDetailsTool};
pub use existence::{AngelExistenceReport, AngelExistenceTool};
