//! Stage assigning a fixed sample list.

use super::{Stage, StageConfig};
use crate::context::PipelineContext;
use crate::errors::StageError;
use async_trait::async_trait;

/// Sets the context's samples to a list known up front.
#[derive(Debug, Clone)]
pub struct SetSamples {
    samples: Vec<String>,
    config: StageConfig,
}

impl SetSamples {
    /// Creates the stage.
    #[must_use]
    pub fn new(samples: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            samples: samples.into_iter().map(Into::into).collect(),
            config: StageConfig::whole("").with_cannot_skip(),
        }
    }
}

#[async_trait]
impl Stage for SetSamples {
    fn name(&self) -> &str {
        "SetSamples"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    async fn run_whole(&self, ctx: &mut PipelineContext, _workers: usize) -> Result<(), StageError> {
        ctx.set_samples(self.samples.iter().cloned());
        Ok(())
    }
}
