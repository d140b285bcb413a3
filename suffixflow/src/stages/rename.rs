//! Stage re-basing the naming scheme through link aliases.
//!
//! `Rename` never recomputes data. For every artifact under the current input
//! prefix it creates a relative symlink under a target stage label and/or
//! suffix, then hands the target naming on to the rest of the chain.

use super::{Stage, StageConfig};
use crate::context::PipelineContext;
use crate::core::{ArtifactMatcher, ExecutionMode, PathAddress};
use crate::errors::StageError;
use crate::utils::relative_link_target;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Re-points the chain at a new stage label and/or suffix.
///
/// Unset targets default to the inherited values, so `with_suffix("")` alone
/// keeps the stage label and drops the accumulated suffix.
#[derive(Debug, Clone)]
pub struct Rename {
    config: StageConfig,
    new_stage: Option<String>,
    new_suffix: Option<String>,
}

impl Rename {
    /// Creates a rename dispatched in `mode`.
    #[must_use]
    pub fn new(mode: ExecutionMode) -> Self {
        Self {
            config: StageConfig::new("", mode),
            new_stage: None,
            new_suffix: None,
        }
    }

    /// Sets the target stage label.
    #[must_use]
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.new_stage = Some(stage.into());
        self
    }

    /// Sets the target suffix.
    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.new_suffix = Some(suffix.into());
        self
    }

    /// Sets the rule selecting which source artifacts get aliased.
    #[must_use]
    pub fn with_matcher(mut self, matcher: ArtifactMatcher) -> Self {
        self.config.matcher = matcher;
        self
    }

    /// Resolves the target naming against the inherited context.
    #[must_use]
    pub fn target<'a>(&'a self, ctx: &'a PipelineContext) -> PathAddress<'a> {
        PathAddress::new(
            &ctx.base_folder,
            self.new_stage.as_deref().unwrap_or(&ctx.stage_label),
            self.new_suffix.as_deref().unwrap_or(&ctx.suffix),
        )
    }

    async fn link_family(&self, ctx: &PipelineContext, sample: &str) -> Result<(), StageError> {
        let source_prefix = ctx.input_path(sample);
        let alias_prefix = self.target(ctx).output_path("", sample);

        let family = self.config.matcher.find_family(&source_prefix)?;
        if family.is_empty() {
            warn!(stage = "Rename", path = %source_prefix, "no artifacts to link");
            return Ok(());
        }

        for rest in family {
            let source = PathBuf::from(format!("{source_prefix}{rest}"));
            let alias = PathBuf::from(format!("{alias_prefix}{rest}"));
            let link_target = relative_link_target(&alias, &source)?;

            clear_alias(&alias).await?;
            info!(
                stage = "Rename",
                path = %alias_prefix,
                "[Rename {}] LINK {} to {}",
                alias_prefix,
                source.display(),
                alias.display()
            );
            create_symlink(&link_target, &alias).await?;
        }
        Ok(())
    }
}

/// Removes a stale alias so it can be recreated. Regular files are refused.
async fn clear_alias(alias: &Path) -> Result<(), StageError> {
    match tokio::fs::symlink_metadata(alias).await {
        Ok(meta) if meta.file_type().is_symlink() => {
            tokio::fs::remove_file(alias).await?;
            Ok(())
        }
        Ok(_) => Err(StageError::AliasConflict(alias.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
async fn create_symlink(target: &Path, alias: &Path) -> io::Result<()> {
    tokio::fs::symlink(target, alias).await
}

#[cfg(windows)]
async fn create_symlink(target: &Path, alias: &Path) -> io::Result<()> {
    tokio::fs::symlink_file(target, alias).await
}

#[async_trait]
impl Stage for Rename {
    fn name(&self) -> &str {
        "Rename"
    }

    fn config(&self) -> &StageConfig {
        &self.config
    }

    fn artifact_prefix(&self, ctx: &PipelineContext, sample: &str) -> String {
        self.target(ctx).output_path("", sample)
    }

    fn before_run(&self, ctx: &mut PipelineContext) -> Result<(), StageError> {
        let target = self.target(ctx);
        if target == ctx.address() {
            return Err(StageError::invalid_config(format!(
                "rename target '{}' is the current naming scheme",
                target.input_path("")
            )));
        }
        debug!(
            stage = "Rename",
            target_stage = %target.stage_label(),
            target_suffix = %target.suffix(),
            "resolved rename target"
        );
        Ok(())
    }

    async fn run_whole(&self, ctx: &mut PipelineContext, _workers: usize) -> Result<(), StageError> {
        self.link_family(ctx, "").await
    }

    async fn run_for_sample(
        &self,
        ctx: &PipelineContext,
        sample: &str,
        _workers: usize,
    ) -> Result<(), StageError> {
        self.link_family(ctx, sample).await
    }

    fn after_run(&self, ctx: &mut PipelineContext) {
        let (stage_label, suffix) = {
            let target = self.target(ctx);
            (target.stage_label().to_string(), target.suffix().to_string())
        };
        ctx.stage_label = stage_label;
        ctx.suffix = suffix;
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;

    fn ctx_in(dir: &Path) -> PipelineContext {
        PipelineContext::new(dir.display().to_string(), "tmp").with_suffix(".bwa")
    }

    #[test]
    fn test_target_defaults_to_inherited() {
        let ctx = PipelineContext::new("data", "tmp").with_suffix(".bwa.sort");

        let keep_stage = Rename::new(ExecutionMode::Whole).with_suffix(".stat");
        assert_eq!(keep_stage.target(&ctx).input_path(""), "data/tmp.stat");

        let keep_suffix = Rename::new(ExecutionMode::Whole).with_stage("tmp2");
        assert_eq!(keep_suffix.target(&ctx).input_path("s1"), "data/tmp2.s1.bwa.sort");
    }

    #[test]
    fn test_skip_check_uses_target() {
        let ctx = PipelineContext::new("data", "tmp").with_suffix(".bwa");
        let stage = Rename::new(ExecutionMode::Sequential)
            .with_stage("tmp2")
            .with_suffix("");
        assert_eq!(stage.artifact_prefix(&ctx, "s1"), "data/tmp2.s1");
        assert_eq!(stage.output_prefix(&ctx, "s1"), "data/tmp.s1.bwa");
    }

    #[test]
    fn test_before_run_rejects_identity() {
        let mut ctx = PipelineContext::new("data", "tmp").with_suffix(".bwa");
        let stage = Rename::new(ExecutionMode::Whole);
        assert!(matches!(
            stage.before_run(&mut ctx),
            Err(StageError::InvalidConfig(_))
        ));

        let same = Rename::new(ExecutionMode::Whole).with_suffix(".bwa");
        assert!(same.before_run(&mut ctx).is_err());
    }

    #[test]
    fn test_after_run_commits_target() {
        let mut ctx = PipelineContext::new("data", "tmp").with_suffix(".bwa");
        let stage = Rename::new(ExecutionMode::Sequential)
            .with_stage("tmp2")
            .with_suffix("");
        stage.after_run(&mut ctx);
        assert_eq!(ctx.stage_label, "tmp2");
        assert_eq!(ctx.suffix, "");
    }

    #[tokio::test]
    async fn test_links_sample_family() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tmp.s1.bwa.bam"), b"bwa\n11\n12\n").unwrap();
        fs::write(dir.path().join("tmp.s1.bwa.bam.bai"), b"idx").unwrap();

        let ctx = ctx_in(dir.path());
        let stage = Rename::new(ExecutionMode::Sequential)
            .with_stage("tmp2")
            .with_suffix("");
        stage.run_for_sample(&ctx, "s1", 1).await.unwrap();

        let alias = dir.path().join("tmp2.s1.bam");
        let link = fs::read_link(&alias).unwrap();
        assert_eq!(link, PathBuf::from("tmp.s1.bwa.bam"));
        assert_eq!(fs::read(&alias).unwrap(), b"bwa\n11\n12\n");
        assert!(dir.path().join("tmp2.s1.bam.bai").exists());
    }

    #[tokio::test]
    async fn test_links_whole_family() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tmp.bwa.txt"), b"merged").unwrap();

        let mut ctx = ctx_in(dir.path());
        let stage = Rename::new(ExecutionMode::Whole).with_suffix(".stat");
        stage.run_whole(&mut ctx, 1).await.unwrap();

        assert_eq!(fs::read(dir.path().join("tmp.stat.txt")).unwrap(), b"merged");
    }

    #[tokio::test]
    async fn test_relinking_replaces_symlink() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tmp.s1.bwa.bam"), b"v1").unwrap();

        let ctx = ctx_in(dir.path());
        let stage = Rename::new(ExecutionMode::Sequential).with_suffix("");
        stage.run_for_sample(&ctx, "s1", 1).await.unwrap();
        stage.run_for_sample(&ctx, "s1", 1).await.unwrap();

        assert_eq!(fs::read(dir.path().join("tmp.s1.bam")).unwrap(), b"v1");
    }

    #[tokio::test]
    async fn test_refuses_to_replace_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tmp.s1.bwa.bam"), b"v1").unwrap();
        fs::write(dir.path().join("tmp.s1.bam"), b"precious").unwrap();

        let ctx = ctx_in(dir.path());
        let stage = Rename::new(ExecutionMode::Sequential).with_suffix("");
        let err = stage.run_for_sample(&ctx, "s1", 1).await.unwrap_err();

        assert!(matches!(err, StageError::AliasConflict(_)));
        assert_eq!(fs::read(dir.path().join("tmp.s1.bam")).unwrap(), b"precious");
    }

    #[tokio::test]
    async fn test_nothing_to_link_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = ctx_in(dir.path());
        let stage = Rename::new(ExecutionMode::Sequential).with_suffix("");
        stage.run_for_sample(&ctx, "s1", 1).await.unwrap();
    }
}
