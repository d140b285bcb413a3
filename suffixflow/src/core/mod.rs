//! Core domain model types for suffixflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Path addressing derived from the accumulated suffix
//! - Stage execution modes
//! - Artifact family matching for the skip cache

mod address;
mod matcher;
mod mode;

pub use address::PathAddress;
pub use matcher::ArtifactMatcher;
pub use mode::ExecutionMode;
