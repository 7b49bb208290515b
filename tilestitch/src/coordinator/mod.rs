//! Orchestration of a stitching run.

mod phase;
mod run;

pub use phase::RunPhase;
pub use run::{RunCoordinator, RunReport, StitchOutcome, StitchRequest};
