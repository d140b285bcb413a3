//! Stage reading the sample list from a sheet next to the input prefix.

use super::{Stage, StageConfig};
use crate::context::PipelineContext;
use crate::errors::StageError;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

/// Default extension of the sample sheet.
pub const SAMPLE_SHEET_EXTENSION: &str = ".samples.csv";

/// Loads samples from `<input>.samples.csv`, one name per line.
#[derive(Debug, Clone)]
pub struct SampleSheet {
    extension: String,
    config: StageConfig,
}

impl Default for SampleSheet {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSheet {
    /// Creates the stage with the default sheet extension.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extension: SAMPLE_SHEET_EXTENSION.to_string(),
            config: StageConfig::whole("").with_cannot_skip(),
        }
    }

    /// Reads the sheet from `<input><extension>` instead.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    fn sheet_path(&self, ctx: &PipelineContext) -> PathBuf {
        PathBuf::from(format!("{}{}", ctx.input_path(""), self.extension))
    }
}

/// Splits sheet text into sample names, dropping blank lines.
pub fn parse_sample_sheet(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

#[async_trait]
impl Stage for SampleSheet {
    fn name(&self) -> &str {
        "SampleSheet"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn required_paths(&self, ctx: &PipelineContext, _sample: &str) -> Vec<PathBuf> {
        vec![self.sheet_path(ctx)]
    }

    async fn run_whole(&self, ctx: &mut PipelineContext, _workers: usize) -> Result<(), StageError> {
        let path = self.sheet_path(ctx);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StageError::MissingInput(path));
            }
            Err(e) => return Err(e.into()),
        };
        let samples = parse_sample_sheet(&text);
        info!(stage = "SampleSheet", path = %path.display(), count = samples.len(), "loaded samples");
        ctx.set_samples(samples);
        Ok(())
    }
}
