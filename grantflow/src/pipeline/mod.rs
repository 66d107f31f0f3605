//! The pipeline orchestrator and its supporting pieces.
//!
//! The orchestrator drives the fixed eight-stage evaluation state
//! machine: it invokes collaborators in order, emits stage-transition
//! events to the status broadcaster, and assembles the final report.

mod assemble;
pub mod budget;
mod config;
mod orchestrator;


pub use assemble::assemble_report;
pub use config::RunConfig;
pub use orchestrator::Orchestrator;
