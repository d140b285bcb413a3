//! Stage trait and built-in stages.
//!
//! Stages are the units of work in a suffixflow chain. Each one declares its
//! output fragment and execution mode up front in a [`StageConfig`], and
//! implements the body matching that mode.

mod command;
mod rename;
mod sample_sheet;
mod set_samples;

pub use command::CommandStage;
pub use rename::Rename;
pub use sample_sheet::{parse_sample_sheet, SampleSheet, SAMPLE_SHEET_EXTENSION};
pub use set_samples::SetSamples;

use crate::context::PipelineContext;
use crate::core::{ArtifactMatcher, ExecutionMode};
use crate::errors::StageError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;

/// The declared shape of a stage.
#[derive(Debug, Clone)]
pub struct StageConfig {
    /// Fragment this stage appends to the running suffix.
    pub suffix_add: String,
    /// How the stage's body is dispatched.
    pub mode: ExecutionMode,
    /// Output is never cached; the stage always runs.
    pub cannot_skip: bool,
    /// Disable skip-caching here and downstream.
    pub force: bool,
    /// Rule deciding whether the output family already exists.
    pub matcher: ArtifactMatcher,
}

impl StageConfig {
    /// Creates a configuration with the given fragment and mode.
    #[must_use]
    pub fn new(suffix_add: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            suffix_add: suffix_add.into(),
            mode,
            cannot_skip: false,
            force: false,
            matcher: ArtifactMatcher::default(),
        }
    }

    /// A stage called once for the whole pipeline.
    #[must_use]
    pub fn whole(suffix_add: impl Into<String>) -> Self {
        Self::new(suffix_add, ExecutionMode::Whole)
    }

    /// A stage called per sample, in order.
    #[must_use]
    pub fn sequential(suffix_add: impl Into<String>) -> Self {
        Self::new(suffix_add, ExecutionMode::Sequential)
    }

    /// A stage called per sample on the worker pool.
    #[must_use]
    pub fn parallel(suffix_add: impl Into<String>) -> Self {
        Self::new(suffix_add, ExecutionMode::Parallel)
    }

    /// Marks the stage's output as never cached.
    #[must_use]
    pub fn with_cannot_skip(mut self) -> Self {
        self.cannot_skip = true;
        self
    }

    /// Forces this stage and every later one to run.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets the artifact family rule.
    #[must_use]
    pub fn with_matcher(mut self, matcher: ArtifactMatcher) -> Self {
        self.matcher = matcher;
        self
    }
}

/// Trait for pipeline stages.
///
/// The runner hands each stage its own copy of the [`PipelineContext`].
/// Hooks and `run_whole` may rewrite that copy; whatever it holds after
/// `after_run` is what the next stage inherits. Per-sample bodies only read
/// it, since several of them may run at once.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name used to tag log lines and reports.
    fn name(&self) -> &str;

    /// Returns the stage's declared configuration.
    fn config(&self) -> &StageConfig;

    /// Paths that must exist before the stage runs for `sample`.
    ///
    /// `sample` is empty for whole-mode stages.
    fn required_paths(&self, _ctx: &PipelineContext, _sample: &str) -> Vec<PathBuf> {
        Vec::new()
    }

    /// The output prefix this stage writes for `sample`.
    fn output_prefix(&self, ctx: &PipelineContext, sample: &str) -> String {
        ctx.output_path(&self.config().suffix_add, sample)
    }

    /// The prefix whose artifact family, when present, lets the stage be
    /// skipped. Defaults to [`Stage::output_prefix`].
    fn artifact_prefix(&self, ctx: &PipelineContext, sample: &str) -> String {
        self.output_prefix(ctx, sample)
    }

    /// Runs before dispatch. An error halts the chain.
    fn before_run(&self, _ctx: &mut PipelineContext) -> Result<(), StageError> {
        Ok(())
    }

    /// Body for [`ExecutionMode::Whole`].
    async fn run_whole(&self, _ctx: &mut PipelineContext, _workers: usize) -> Result<(), StageError> {
        Err(StageError::unsupported(self.name(), ExecutionMode::Whole))
    }

    /// Body for [`ExecutionMode::Sequential`] and [`ExecutionMode::Parallel`].
    ///
    /// In parallel mode each call is driven on tokio's blocking pool while it
    /// holds one of the stage's pool slots, so the body may block on an
    /// external command. Up to `min(worker_budget, samples)` calls run at
    /// once regardless of the runtime's worker-thread count. Sequential and
    /// whole-mode bodies run on the caller's task and should prefer async I/O.
    async fn run_for_sample(
        &self,
        _ctx: &PipelineContext,
        _sample: &str,
        _workers: usize,
    ) -> Result<(), StageError> {
        Err(StageError::unsupported(self.name(), self.config().mode))
    }

    /// Runs after dispatch, whether or not the stage halted.
    fn after_run(&self, _ctx: &mut PipelineContext) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Bare {
        config: StageConfig,
    }

    #[async_trait]
    impl Stage for Bare {
        fn name(&self) -> &str {
            "Bare"
        }

        fn config(&self) -> &StageConfig {
            &self.config
        }
    }

    #[test]
    fn test_config_builders() {
        let config = StageConfig::parallel(".bwa").with_cannot_skip().with_force(true);
        assert_eq!(config.suffix_add, ".bwa");
        assert_eq!(config.mode, ExecutionMode::Parallel);
        assert!(config.cannot_skip);
        assert!(config.force);
        assert!(matches!(config.matcher, ArtifactMatcher::DottedFamily));
    }

    #[test]
    fn test_default_prefixes() {
        let stage = Bare {
            config: StageConfig::sequential(".sort"),
        };
        let ctx = PipelineContext::new("data", "tmp").with_suffix(".bwa");

        assert_eq!(stage.output_prefix(&ctx, "s1"), "data/tmp.s1.bwa.sort");
        assert_eq!(stage.artifact_prefix(&ctx, "s1"), "data/tmp.s1.bwa.sort");
        assert!(stage.required_paths(&ctx, "s1").is_empty());
    }

    #[tokio::test]
    async fn test_missing_bodies_are_unsupported() {
        let stage = Bare {
            config: StageConfig::whole(""),
        };
        let mut ctx = PipelineContext::default();

        let err = stage.run_whole(&mut ctx, 1).await.unwrap_err();
        assert!(matches!(err, StageError::Unsupported { .. }));

        let err = stage.run_for_sample(&ctx, "s1", 1).await.unwrap_err();
        assert!(matches!(err, StageError::Unsupported { .. }));
    }
}
