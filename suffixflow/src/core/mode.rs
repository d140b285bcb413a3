//! Stage execution modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a stage's body is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One call to `run_whole` for the entire pipeline.
    #[serde(rename = "none")]
    Whole,
    /// One call to `run_for_sample` per sample, in sample order.
    Sequential,
    /// One call to `run_for_sample` per sample, on a bounded worker pool.
    Parallel,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Whole => write!(f, "none"),
            Self::Sequential => write!(f, "sequential"),
            Self::Parallel => write!(f, "parallel"),
        }
    }
}

impl ExecutionMode {
    /// Returns true if the mode iterates over samples.
    #[must_use]
    pub fn is_per_sample(&self) -> bool {
        matches!(self, Self::Sequential | Self::Parallel)
    }
}
