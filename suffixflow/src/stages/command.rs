//! Stage wrapping an external shell command.

use super::{Stage, StageConfig};
use crate::context::PipelineContext;
use crate::errors::StageError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Number of stderr lines kept in a [`StageError::CommandFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// Runs a templated shell command, once or per sample.
///
/// Templates may use these placeholders:
///
/// | placeholder | value                                   |
/// |-------------|-----------------------------------------|
/// | `{input}`   | input path prefix for the sample        |
/// | `{output}`  | output path prefix for the sample       |
/// | `{sample}`  | sample name (empty in whole mode)       |
/// | `{threads}` | workers granted to this call            |
/// | `{base}`    | base folder                             |
/// | `{stage}`   | stage label                             |
///
/// ```rust,ignore
/// let bwa = CommandStage::new(
///     "Bwa",
///     StageConfig::parallel(".bwa"),
///     "bwa mem -t {threads} hg38.fa {input}.R1.fq.gz {input}.R2.fq.gz > {output}.bam",
/// )
/// .with_requirement("{input}.R1.fq.gz")
/// .with_requirement("{input}.R2.fq.gz");
/// ```
#[derive(Debug, Clone)]
pub struct CommandStage {
    name: String,
    config: StageConfig,
    template: String,
    requirements: Vec<String>,
    shell: String,
}

impl CommandStage {
    /// Creates a command stage.
    #[must_use]
    pub fn new(name: impl Into<String>, config: StageConfig, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config,
            template: template.into(),
            requirements: Vec::new(),
            shell: "sh".to_string(),
        }
    }

    /// Adds a required path template.
    #[must_use]
    pub fn with_requirement(mut self, template: impl Into<String>) -> Self {
        self.requirements.push(template.into());
        self
    }

    /// Uses a different shell to run the command (`<shell> -c <command>`).
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    fn render_paths(&self, template: &str, ctx: &PipelineContext, sample: &str) -> String {
        template
            .replace("{input}", &ctx.input_path(sample))
            .replace("{output}", &self.output_prefix(ctx, sample))
            .replace("{sample}", sample)
            .replace("{base}", &ctx.base_folder)
            .replace("{stage}", &ctx.stage_label)
    }

    /// Renders the command line for one call.
    #[must_use]
    pub fn render(&self, ctx: &PipelineContext, sample: &str, workers: usize) -> String {
        self.render_paths(&self.template, ctx, sample)
            .replace("{threads}", &workers.to_string())
    }

    async fn execute(
        &self,
        ctx: &PipelineContext,
        sample: &str,
        workers: usize,
    ) -> Result<(), StageError> {
        let command = self.render(ctx, sample, workers);
        debug!(stage = %self.name, sample = %sample, command = %command, "spawning command");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(&command)
            .stdin(Stdio::null())
            .output()
            .await?;

        if output.status.success() {
            return Ok(());
        }

        Err(StageError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
        })
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}

#[async_trait]
impl Stage for CommandStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn required_paths(&self, ctx: &PipelineContext, sample: &str) -> Vec<PathBuf> {
        self.requirements
            .iter()
            .map(|template| PathBuf::from(self.render_paths(template, ctx, sample)))
            .collect()
    }

    async fn run_whole(&self, ctx: &mut PipelineContext, workers: usize) -> Result<(), StageError> {
        self.execute(ctx, "", workers).await
    }

    async fn run_for_sample(
        &self,
        ctx: &PipelineContext,
        sample: &str,
        workers: usize,
    ) -> Result<(), StageError> {
        self.execute(ctx, sample, workers).await
    }
}
