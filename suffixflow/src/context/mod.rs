//! Context propagated along a pipeline chain.
//!
//! The runner owns one [`PipelineContext`] between stages and hands each
//! stage its own copy for the duration of that stage's dispatch. The copy the
//! stage leaves behind is what the next stage inherits.

mod pipeline;

pub use pipeline::{PipelineContext, DEFAULT_WORKER_BUDGET};
