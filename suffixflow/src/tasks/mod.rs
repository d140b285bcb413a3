//! Bounded per-sample task execution.
//!
//! This module provides:
//! - `SampleTaskGroup` for running per-sample work on a bounded pool and
//!   collecting one result per sample
//! - Worker budget arithmetic shared by the dispatcher

mod budget;
mod task_group;

pub use budget::{pool_size, worker_share};
pub use task_group::SampleTaskGroup;
