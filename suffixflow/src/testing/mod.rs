//! Testing utilities for suffixflow chains.
//!
//! This module provides:
//! - A recording mock stage with failure, delay and concurrency tracking
//! - On-disk sample trees to seed a base folder

mod fixtures;
mod mocks;

pub use fixtures::SampleTree;
pub use mocks::{Call, RecordingStage};
