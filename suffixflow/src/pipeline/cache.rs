//! Skip-cache and requirement checks.
//!
//! The checks stat paths and scan directories with blocking `std::fs`
//! calls. The dispatcher runs them through [`check_samples`], which moves a
//! whole stage's worth of checks onto tokio's blocking pool.

use crate::context::PipelineContext;
use crate::errors::StageError;
use crate::stages::Stage;
use std::path::PathBuf;
use std::sync::Arc;

/// Returns true if the stage may be bypassed for `sample`.
///
/// Never skips when the stage is `cannot_skip` or when `force` is set on
/// the context or the stage. Otherwise skips iff the stage's artifact family
/// exists.
pub fn should_skip(stage: &dyn Stage, ctx: &PipelineContext, sample: &str) -> bool {
    let config = stage.config();
    if config.cannot_skip || config.force || ctx.force {
        return false;
    }
    config.matcher.is_present(&stage.artifact_prefix(ctx, sample))
}

/// Returns the required paths for `sample` that do not exist.
pub fn missing_requirements(stage: &dyn Stage, ctx: &PipelineContext, sample: &str) -> Vec<PathBuf> {
    stage
        .required_paths(ctx, sample)
        .into_iter()
        .filter(|path| !path.exists())
        .collect()
}

/// Pre-dispatch verdict for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCheck {
    /// The sample checked; empty for whole-mode stages.
    pub sample: String,
    /// Required paths that do not exist.
    pub missing: Vec<PathBuf>,
    /// Whether the stage may be bypassed. Only set when nothing is missing.
    pub skip: bool,
}

impl SampleCheck {
    /// Checks one sample synchronously.
    pub fn run(stage: &dyn Stage, ctx: &PipelineContext, sample: &str) -> Self {
        let missing = missing_requirements(stage, ctx, sample);
        let skip = missing.is_empty() && should_skip(stage, ctx, sample);
        Self {
            sample: sample.to_string(),
            missing,
            skip,
        }
    }
}

/// Checks every sample on the blocking pool and returns the verdicts in
/// sample order.
pub async fn check_samples(
    stage: &Arc<dyn Stage>,
    ctx: &PipelineContext,
    samples: Arc<Vec<String>>,
) -> Result<Vec<SampleCheck>, StageError> {
    let stage = Arc::clone(stage);
    let ctx = ctx.clone();
    tokio::task::spawn_blocking(move || {
        samples
            .iter()
            .map(|sample| SampleCheck::run(stage.as_ref(), &ctx, sample))
            .collect()
    })
    .await
    .map_err(|e| StageError::TaskPanicked {
        sample: String::new(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::StageConfig;
    use crate::testing::RecordingStage;
    use std::fs;

    fn setup() -> (tempfile::TempDir, PipelineContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = PipelineContext::new(dir.path().display().to_string(), "tmp");
        (dir, ctx)
    }

    #[test]
    fn test_skips_when_output_exists() {
        let (dir, ctx) = setup();
        let stage = RecordingStage::new("Bwa", StageConfig::sequential(".bwa"));
        assert!(!should_skip(&stage, &ctx, "s1"));

        fs::write(dir.path().join("tmp.s1.bwa.bam"), b"x").unwrap();
        assert!(should_skip(&stage, &ctx, "s1"));
        assert!(!should_skip(&stage, &ctx, "s2"));
    }

    #[test]
    fn test_force_disables_skip() {
        let (dir, ctx) = setup();
        fs::write(dir.path().join("tmp.s1.bwa.bam"), b"x").unwrap();

        let stage = RecordingStage::new("Bwa", StageConfig::sequential(".bwa"));
        assert!(!should_skip(&stage, &ctx.clone().with_force(true), "s1"));

        let forced = RecordingStage::new("Bwa", StageConfig::sequential(".bwa").with_force(true));
        assert!(!should_skip(&forced, &ctx, "s1"));
    }

    #[test]
    fn test_cannot_skip() {
        let (dir, ctx) = setup();
        fs::write(dir.path().join("tmp.bwa.txt"), b"x").unwrap();

        let stage = RecordingStage::new("Merge", StageConfig::whole(".bwa").with_cannot_skip());
        assert!(!should_skip(&stage, &ctx, ""));
    }

    #[test]
    fn test_missing_requirements() {
        let (dir, ctx) = setup();
        let stage = RecordingStage::new("Bwa", StageConfig::sequential(".bwa"))
            .with_requirement(".R1.fq.gz")
            .with_requirement(".R2.fq.gz");

        assert_eq!(missing_requirements(&stage, &ctx, "s1").len(), 2);

        fs::write(dir.path().join("tmp.s1.R1.fq.gz"), b"11").unwrap();
        let missing = missing_requirements(&stage, &ctx, "s1");
        assert_eq!(missing, vec![dir.path().join("tmp.s1.R2.fq.gz")]);

        fs::write(dir.path().join("tmp.s1.R2.fq.gz"), b"12").unwrap();
        assert!(missing_requirements(&stage, &ctx, "s1").is_empty());
    }

    #[tokio::test]
    async fn test_check_samples_in_order() {
        let (dir, ctx) = setup();
        fs::write(dir.path().join("tmp.s1.in"), b"").unwrap();
        fs::write(dir.path().join("tmp.s3.in"), b"").unwrap();
        fs::write(dir.path().join("tmp.s3.x.txt"), b"cached").unwrap();
        let stage: Arc<dyn Stage> =
            Arc::new(RecordingStage::new("X", StageConfig::sequential(".x")).with_requirement(".in"));

        let samples = Arc::new(vec!["s3".to_string(), "s2".to_string(), "s1".to_string()]);
        let checks = check_samples(&stage, &ctx, samples).await.unwrap();

        let order: Vec<&str> = checks.iter().map(|c| c.sample.as_str()).collect();
        assert_eq!(order, vec!["s3", "s2", "s1"]);
        assert!(checks[0].skip && checks[0].missing.is_empty());
        assert_eq!(checks[1].missing, vec![dir.path().join("tmp.s2.in")]);
        assert!(!checks[1].skip);
        assert!(!checks[2].skip && checks[2].missing.is_empty());
    }

    #[test]
    fn test_missing_sample_never_skips() {
        let (dir, ctx) = setup();
        fs::write(dir.path().join("tmp.s1.x.txt"), b"cached").unwrap();
        let stage = RecordingStage::new("X", StageConfig::sequential(".x")).with_requirement(".in");

        let check = SampleCheck::run(&stage, &ctx, "s1");
        assert_eq!(check.missing.len(), 1);
        assert!(!check.skip);
    }
}
