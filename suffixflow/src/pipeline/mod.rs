//! Pipeline dispatch and execution.
//!
//! This module provides:
//! - The skip-cache and requirement checks
//! - Per-stage dispatch over execution modes
//! - The linear chain runner
//! - Stage and pipeline reports

mod cache;
mod dispatch;
mod report;
mod runner;

pub use cache::{check_samples, missing_requirements, should_skip, SampleCheck};
pub use dispatch::check_run;
pub use report::{PipelineReport, SampleOutcome, StageReport};
pub use runner::PipelineRunner;
