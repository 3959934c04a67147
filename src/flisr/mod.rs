//! Fault Location, Isolation and Service Restoration.

pub mod distance;
pub mod error;
pub mod planner;
pub mod workflow;

pub use distance::{estimate, DistanceResult};
pub use error::FlisrError;
pub use planner::plan;
pub use workflow::{FlisrOutcome, FlisrWorkflow, WorkflowStage};
