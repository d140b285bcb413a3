//! Dispatch event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What the dispatcher decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchDecision {
    /// The stage body is being invoked.
    Run,
    /// Output already exists; the body is bypassed.
    Skip,
    /// A required path is absent.
    Missing,
    /// The body returned an error or its worker panicked.
    Failed,
    /// The chain stops after this stage.
    Halt,
}

impl fmt::Display for DispatchDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Run => write!(f, "RUN"),
            Self::Skip => write!(f, "SKIP"),
            Self::Missing => write!(f, "MISS"),
            Self::Failed => write!(f, "FAIL"),
            Self::Halt => write!(f, "STOP"),
        }
    }
}

/// A single dispatch decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchEvent {
    /// The decision taken.
    pub decision: DispatchDecision,
    /// Name of the stage.
    pub stage: String,
    /// The stage's current output prefix.
    pub path: String,
    /// The sample concerned, if per-sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    /// Missing path or error message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// When the decision was taken.
    pub timestamp: DateTime<Utc>,
}

impl DispatchEvent {
    /// Creates a new event stamped now.
    #[must_use]
    pub fn new(decision: DispatchDecision, stage: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            decision,
            stage: stage.into(),
            path: path.into(),
            sample: None,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    /// Sets the sample, ignoring empty names.
    #[must_use]
    pub fn with_sample(mut self, sample: &str) -> Self {
        if !sample.is_empty() {
            self.sample = Some(sample.to_string());
        }
        self
    }

    /// Sets the detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Renders the event as `[Stage path] DECISION sample: detail`.
    #[must_use]
    pub fn line(&self) -> String {
        let mut line = format!("[{} {}] {}", self.stage, self.path, self.decision);
        if let Some(ref sample) = self.sample {
            line.push(' ');
            line.push_str(sample);
        }
        if let Some(ref detail) = self.detail {
            line.push_str(": ");
            line.push_str(detail);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        let event = DispatchEvent::new(DispatchDecision::Skip, "Bwa", "data/tmp.bwa");
        assert_eq!(event.line(), "[Bwa data/tmp.bwa] SKIP");

        let event = DispatchEvent::new(DispatchDecision::Missing, "Bwa", "data/tmp.bwa")
            .with_sample("s1")
            .with_detail("data/tmp.s1.R1.fq.gz");
        assert_eq!(event.line(), "[Bwa data/tmp.bwa] MISS s1: data/tmp.s1.R1.fq.gz");
    }

    #[test]
    fn test_empty_sample_ignored() {
        let event = DispatchEvent::new(DispatchDecision::Run, "Merge", "data/tmp").with_sample("");
        assert!(event.sample.is_none());
    }

    #[test]
    fn test_event_serialize() {
        let event = DispatchEvent::new(DispatchDecision::Halt, "Bwa", "data/tmp.bwa");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["decision"], "halt");
        assert!(json.get("sample").is_none());
    }
}
