//! Reports produced by dispatch and chain runs.

use crate::core::ExecutionMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// What happened to one sample (or to the whole call, keyed by `""`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SampleOutcome {
    /// The body ran and returned successfully.
    Ran,
    /// Output already existed.
    Skipped,
    /// Required inputs were absent; the body was not called.
    MissingRequirement {
        /// The absent paths.
        paths: Vec<PathBuf>,
    },
    /// The body returned an error or its worker panicked.
    Failed {
        /// The error message.
        error: String,
    },
}

impl SampleOutcome {
    /// Returns true if this outcome stops the chain.
    #[must_use]
    pub fn is_halting(&self) -> bool {
        matches!(self, Self::MissingRequirement { .. } | Self::Failed { .. })
    }
}

/// Result of dispatching one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// Stage name.
    pub stage: String,
    /// Mode the stage was dispatched in.
    pub mode: ExecutionMode,
    /// Output prefix at dispatch time.
    pub output_prefix: String,
    /// Per-sample outcomes in sample order.
    pub outcomes: Vec<(String, SampleOutcome)>,
    /// Whether the stage stopped the chain.
    pub halted: bool,
    /// Hook error that prevented dispatch, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Dispatch time in milliseconds.
    pub duration_ms: f64,
}

impl StageReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(stage: impl Into<String>, mode: ExecutionMode, output_prefix: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            mode,
            output_prefix: output_prefix.into(),
            outcomes: Vec::new(),
            halted: false,
            error: None,
            duration_ms: 0.0,
        }
    }

    /// Records an outcome.
    pub fn record(&mut self, sample: impl Into<String>, outcome: SampleOutcome) {
        self.outcomes.push((sample.into(), outcome));
    }

    /// Returns the outcome recorded for `sample`.
    #[must_use]
    pub fn outcome(&self, sample: &str) -> Option<&SampleOutcome> {
        self.outcomes
            .iter()
            .find(|(s, _)| s == sample)
            .map(|(_, outcome)| outcome)
    }

    fn samples_where(&self, pred: impl Fn(&SampleOutcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| pred(outcome))
            .map(|(s, _)| s.as_str())
            .collect()
    }

    /// Samples whose body ran successfully.
    #[must_use]
    pub fn ran(&self) -> Vec<&str> {
        self.samples_where(|o| matches!(o, SampleOutcome::Ran))
    }

    /// Samples bypassed by the skip cache.
    #[must_use]
    pub fn skipped(&self) -> Vec<&str> {
        self.samples_where(|o| matches!(o, SampleOutcome::Skipped))
    }

    /// Samples with absent requirements.
    #[must_use]
    pub fn missing(&self) -> Vec<&str> {
        self.samples_where(|o| matches!(o, SampleOutcome::MissingRequirement { .. }))
    }

    /// Samples whose body failed.
    #[must_use]
    pub fn failed(&self) -> Vec<&str> {
        self.samples_where(|o| matches!(o, SampleOutcome::Failed { .. }))
    }
}

/// Result of running a chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// Identifier of this run.
    pub run_id: Uuid,
    /// Reports of the stages that were dispatched, in order.
    pub stages: Vec<StageReport>,
    /// Name of the stage that stopped the chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted_at: Option<String>,
    /// Total time in milliseconds.
    pub duration_ms: f64,
}

impl PipelineReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            stages: Vec::new(),
            halted_at: None,
            duration_ms: 0.0,
        }
    }

    /// Returns true if every stage was dispatched without halting.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.halted_at.is_none()
    }

    /// Returns the first report for the named stage.
    #[must_use]
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.stage == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> StageReport {
        let mut report = StageReport::new("Bwa", ExecutionMode::Parallel, "data/tmp.bwa");
        report.record("s1", SampleOutcome::Ran);
        report.record("s2", SampleOutcome::Skipped);
        report.record(
            "s3",
            SampleOutcome::MissingRequirement {
                paths: vec![PathBuf::from("data/tmp.s3.R1.fq.gz")],
            },
        );
        report.record(
            "s4",
            SampleOutcome::Failed {
                error: "exit 1".to_string(),
            },
        );
        report
    }

    #[test]
    fn test_outcome_queries() {
        let report = report();
        assert_eq!(report.ran(), vec!["s1"]);
        assert_eq!(report.skipped(), vec!["s2"]);
        assert_eq!(report.missing(), vec!["s3"]);
        assert_eq!(report.failed(), vec!["s4"]);
        assert_eq!(report.outcome("s2"), Some(&SampleOutcome::Skipped));
        assert!(report.outcome("s9").is_none());
    }

    #[test]
    fn test_halting_outcomes() {
        assert!(!SampleOutcome::Ran.is_halting());
        assert!(!SampleOutcome::Skipped.is_halting());
        assert!(SampleOutcome::Failed { error: String::new() }.is_halting());
        assert!(SampleOutcome::MissingRequirement { paths: vec![] }.is_halting());
    }

    #[test]
    fn test_outcome_serialize() {
        let json = serde_json::to_value(SampleOutcome::Failed {
            error: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"status": "failed", "error": "boom"}));
    }

    #[test]
    fn test_pipeline_report() {
        let mut pipeline = PipelineReport::new(Uuid::new_v4());
        assert!(pipeline.is_success());

        pipeline.stages.push(report());
        pipeline.halted_at = Some("Bwa".to_string());
        assert!(!pipeline.is_success());
        assert!(pipeline.stage("Bwa").is_some());
        assert!(pipeline.stage("Sort").is_none());
    }
}
