//! Suffix-based path addressing.
//!
//! Every artifact lives at `base/stage[.sample]suffix`, and a stage's output
//! appends its own fragment to that. The composition is plain string
//! concatenation so externally produced files line up byte for byte.

/// A view over the three context fields that determine artifact paths.
///
/// Addresses are never cached: the suffix and stage label change as the
/// chain advances, so callers build one from the current context per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathAddress<'a> {
    base_folder: &'a str,
    stage_label: &'a str,
    suffix: &'a str,
}

impl<'a> PathAddress<'a> {
    /// Creates a new address view.
    #[must_use]
    pub fn new(base_folder: &'a str, stage_label: &'a str, suffix: &'a str) -> Self {
        Self {
            base_folder,
            stage_label,
            suffix,
        }
    }

    /// Returns the base folder.
    #[must_use]
    pub fn base_folder(&self) -> &'a str {
        self.base_folder
    }

    /// Returns the stage label.
    #[must_use]
    pub fn stage_label(&self) -> &'a str {
        self.stage_label
    }

    /// Returns the accumulated suffix.
    #[must_use]
    pub fn suffix(&self) -> &'a str {
        self.suffix
    }

    /// Returns the path prefix a stage reads from.
    ///
    /// The sample discriminator (and its dot) is only inserted when both the
    /// sample name and the stage label are non-empty.
    #[must_use]
    pub fn input_path(&self, sample: &str) -> String {
        let mut path = String::with_capacity(
            self.base_folder.len() + self.stage_label.len() + sample.len() + self.suffix.len() + 2,
        );
        path.push_str(self.base_folder);
        path.push('/');
        path.push_str(self.stage_label);
        if !sample.is_empty() && !self.stage_label.is_empty() {
            path.push('.');
            path.push_str(sample);
        }
        path.push_str(self.suffix);
        path
    }

    /// Returns the path prefix a stage with `suffix_add` writes to.
    #[must_use]
    pub fn output_path(&self, suffix_add: &str, sample: &str) -> String {
        let mut path = self.input_path(sample);
        path.push_str(suffix_add);
        path
    }
}
