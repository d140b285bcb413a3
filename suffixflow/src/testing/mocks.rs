//! Mock stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::context::PipelineContext;
use crate::errors::StageError;
use crate::stages::{Stage, StageConfig};

/// One invocation of a [`RecordingStage`] body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Sample the body ran for; empty in whole mode.
    pub sample: String,
    /// Workers granted to the call.
    pub workers: usize,
    /// Suffix of the context the body saw.
    pub suffix: String,
    /// Input prefix for the sample.
    pub input_prefix: String,
    /// Output prefix for the sample.
    pub output_prefix: String,
}

/// A configurable stage that records every body call.
///
/// On success it writes `{output}{ext}` (`.txt` by default) so reruns see
/// its output and skip. Requirements are extensions appended to the input
/// prefix of each sample.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    config: StageConfig,
    requirements: Vec<String>,
    output_ext: String,
    failing: HashSet<String>,
    delay: Option<Duration>,
    blocking_delay: Option<Duration>,
    calls: Mutex<Vec<Call>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingStage {
    /// Creates a recording stage.
    #[must_use]
    pub fn new(name: impl Into<String>, config: StageConfig) -> Self {
        Self {
            name: name.into(),
            config,
            requirements: Vec::new(),
            output_ext: ".txt".to_string(),
            failing: HashSet::new(),
            delay: None,
            blocking_delay: None,
            calls: Mutex::new(Vec::new()),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Requires `{input}{ext}` to exist for every sample.
    #[must_use]
    pub fn with_requirement(mut self, ext: impl Into<String>) -> Self {
        self.requirements.push(ext.into());
        self
    }

    /// Sets the extension of the file written on success.
    #[must_use]
    pub fn with_output_ext(mut self, ext: impl Into<String>) -> Self {
        self.output_ext = ext.into();
        self
    }

    /// Makes the body fail for `sample`. Use `""` for whole mode.
    #[must_use]
    pub fn failing_on(mut self, sample: impl Into<String>) -> Self {
        self.failing.insert(sample.into());
        self
    }

    /// Sleeps inside every body call.
    #[must_use]
    pub fn with_delay_ms(mut self, ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(ms));
        self
    }

    /// Blocks the calling thread inside every body call, like a body waiting
    /// on an external tool.
    #[must_use]
    pub fn with_blocking_delay_ms(mut self, ms: u64) -> Self {
        self.blocking_delay = Some(Duration::from_millis(ms));
        self
    }

    /// Returns the recorded calls in completion order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Returns the samples of the recorded calls.
    #[must_use]
    pub fn called_samples(&self) -> Vec<String> {
        self.calls.lock().iter().map(|c| c.sample.clone()).collect()
    }

    /// Returns the highest number of bodies seen running at once.
    #[must_use]
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn body(&self, ctx: &PipelineContext, sample: &str, workers: usize) -> Result<(), StageError> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(delay) = self.blocking_delay {
            std::thread::sleep(delay);
        }

        let output_prefix = self.output_prefix(ctx, sample);
        self.calls.lock().push(Call {
            sample: sample.to_string(),
            workers,
            suffix: ctx.suffix.clone(),
            input_prefix: ctx.input_path(sample),
            output_prefix: output_prefix.clone(),
        });

        let result = if self.failing.contains(sample) {
            Err(StageError::Other(anyhow::anyhow!(
                "{} failed on '{sample}'",
                self.name
            )))
        } else {
            tokio::fs::write(format!("{output_prefix}{}", self.output_ext), sample.as_bytes())
                .await
                .map_err(StageError::from)
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn required_paths(&self, ctx: &PipelineContext, sample: &str) -> Vec<PathBuf> {
        let input = ctx.input_path(sample);
        self.requirements
            .iter()
            .map(|ext| PathBuf::from(format!("{input}{ext}")))
            .collect()
    }

    async fn run_whole(&self, ctx: &mut PipelineContext, workers: usize) -> Result<(), StageError> {
        self.body(ctx, "", workers).await
    }

    async fn run_for_sample(
        &self,
        ctx: &PipelineContext,
        sample: &str,
        workers: usize,
    ) -> Result<(), StageError> {
        self.body(ctx, sample, workers).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_writes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::new(dir.path().display().to_string(), "tmp");
        let stage = RecordingStage::new("Bwa", StageConfig::sequential(".bwa"));

        stage.run_for_sample(&ctx, "s1", 3).await.unwrap();

        let calls = stage.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].workers, 3);
        assert_eq!(calls[0].input_prefix, format!("{}/tmp.s1", dir.path().display()));
        assert!(dir.path().join("tmp.s1.bwa.txt").exists());
        assert_eq!(stage.peak_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_failing_sample_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::new(dir.path().display().to_string(), "tmp");
        let stage = RecordingStage::new("Bwa", StageConfig::sequential(".bwa")).failing_on("s2");

        assert!(stage.run_for_sample(&ctx, "s2", 1).await.is_err());
        assert!(!dir.path().join("tmp.s2.bwa.txt").exists());
        assert_eq!(stage.called_samples(), vec!["s2"]);
    }
}
