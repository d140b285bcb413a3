//! On-disk fixtures for chain tests.

use std::io;
use std::path::{Path, PathBuf};

use crate::context::PipelineContext;
use crate::stages::SAMPLE_SHEET_EXTENSION;

/// A base folder seeded with a sample sheet and per-sample input files.
///
/// ```rust,ignore
/// let tree = SampleTree::new(dir.path(), "tmp")
///     .with_samples(["s1", "s2", "s3"])
///     .with_paired_reads()?;
/// tree.write_sample_sheet()?;
/// let mut ctx = tree.context();
/// ```
#[derive(Debug, Clone)]
pub struct SampleTree {
    base: PathBuf,
    stage_label: String,
    samples: Vec<String>,
}

impl SampleTree {
    /// Creates a tree rooted at `base`, which must already exist.
    #[must_use]
    pub fn new(base: impl AsRef<Path>, stage_label: impl Into<String>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
            stage_label: stage_label.into(),
            samples: Vec::new(),
        }
    }

    /// Sets the sample names.
    #[must_use]
    pub fn with_samples(mut self, samples: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.samples = samples.into_iter().map(Into::into).collect();
        self
    }

    /// Writes `.R1.fq.gz` and `.R2.fq.gz` inputs for every sample.
    pub fn with_paired_reads(self) -> io::Result<Self> {
        for (i, sample) in self.samples.iter().enumerate() {
            self.write_input(sample, ".R1.fq.gz", &format!("{}1\n", i + 1))?;
            self.write_input(sample, ".R2.fq.gz", &format!("{}2\n", i + 1))?;
        }
        Ok(self)
    }

    /// Returns the base folder.
    #[must_use]
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Returns the sample names.
    #[must_use]
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Writes `<base>/<stage>.samples.csv`, one sample per line.
    pub fn write_sample_sheet(&self) -> io::Result<PathBuf> {
        let path = self.path(&format!("{}{}", self.stage_label, SAMPLE_SHEET_EXTENSION));
        let body: String = self.samples.iter().map(|s| format!("{s}\n")).collect();
        std::fs::write(&path, body)?;
        Ok(path)
    }

    /// Writes `<base>/<stage>.<sample><ext>`.
    pub fn write_input(&self, sample: &str, ext: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.path(&format!("{}.{sample}{ext}", self.stage_label));
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Returns `<base>/<name>`.
    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Builds a starting context for this tree with no samples loaded.
    #[must_use]
    pub fn context(&self) -> PipelineContext {
        PipelineContext::new(self.base.display().to_string(), self.stage_label.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_layout() {
        let dir = tempfile::tempdir().unwrap();
        let tree = SampleTree::new(dir.path(), "tmp")
            .with_samples(["s1", "s2"])
            .with_paired_reads()
            .unwrap();
        let sheet = tree.write_sample_sheet().unwrap();

        assert_eq!(std::fs::read_to_string(sheet).unwrap(), "s1\ns2\n");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("tmp.s2.R1.fq.gz")).unwrap(),
            "21\n"
        );
        assert_eq!(tree.context().input_path("s1"), format!("{}/tmp.s1", dir.path().display()));
    }
}
