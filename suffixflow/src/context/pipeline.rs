//! The propagated pipeline state.

use crate::core::PathAddress;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of workers available to a stage.
pub const DEFAULT_WORKER_BUDGET: usize = 30;

/// State threaded through a chain run.
///
/// Copies are cheap: the sample list is shared behind an [`Arc`], so a stage
/// that wants a different list must assign a new one with
/// [`PipelineContext::set_samples`] rather than edit the shared one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineContext {
    /// Root directory for all artifacts.
    pub base_folder: String,
    /// Logical stage/run identifier, used as a path segment.
    pub stage_label: String,
    /// Accumulated dotted suffix of every completed stage.
    pub suffix: String,
    /// Sample identifiers for per-sample stages.
    pub samples: Arc<Vec<String>>,
    /// Disables skip-caching for this and every downstream stage.
    pub force: bool,
    /// Maximum concurrent workers available to one stage.
    pub worker_budget: usize,
    /// Set when the chain must stop after the current stage.
    #[serde(default)]
    pub halt: bool,
}

impl Default for PipelineContext {
    fn default() -> Self {
        Self::new("data", "tmp")
    }
}

impl PipelineContext {
    /// Creates a context with an empty suffix and no samples.
    #[must_use]
    pub fn new(base_folder: impl Into<String>, stage_label: impl Into<String>) -> Self {
        Self {
            base_folder: base_folder.into(),
            stage_label: stage_label.into(),
            suffix: String::new(),
            samples: Arc::new(Vec::new()),
            force: false,
            worker_budget: DEFAULT_WORKER_BUDGET,
            halt: false,
        }
    }

    /// Sets the starting suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Sets the sample list.
    #[must_use]
    pub fn with_samples(mut self, samples: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.set_samples(samples);
        self
    }

    /// Forces every stage of the run to bypass the skip cache.
    #[must_use]
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Sets the worker budget.
    #[must_use]
    pub fn with_worker_budget(mut self, workers: usize) -> Self {
        self.worker_budget = workers;
        self
    }

    /// Replaces the sample list.
    pub fn set_samples(&mut self, samples: impl IntoIterator<Item = impl Into<String>>) {
        self.samples = Arc::new(samples.into_iter().map(Into::into).collect());
    }

    /// Returns the sample list.
    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Returns the address view for the current stage label and suffix.
    #[must_use]
    pub fn address(&self) -> PathAddress<'_> {
        PathAddress::new(&self.base_folder, &self.stage_label, &self.suffix)
    }

    /// Shorthand for `self.address().input_path(sample)`.
    #[must_use]
    pub fn input_path(&self, sample: &str) -> String {
        self.address().input_path(sample)
    }

    /// Shorthand for `self.address().output_path(suffix_add, sample)`.
    #[must_use]
    pub fn output_path(&self, suffix_add: &str, sample: &str) -> String {
        self.address().output_path(suffix_add, sample)
    }

    /// Produces the copy a stage runs with.
    ///
    /// Every field is carried over except `force`, which ORs with the
    /// stage's own flag, and `halt`, which starts cleared.
    #[must_use]
    pub fn inherit(&self, stage_force: bool) -> Self {
        Self {
            force: self.force || stage_force,
            halt: false,
            ..self.clone()
        }
    }
}
